//! 읽기 벤치마크 모델.
//!
//! 같은 필터에 대해 count와 fetch를 짝지어 측정하고,
//! 두 결과의 카디널리티가 같은지 검증한다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::CoreError;
use crate::models::event::RawEvent;
use crate::models::filter::Filter;

/// 이름 붙은 벤치마크 한 단위
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Benchmark {
    pub name: String,
    pub filter: Filter,
}

impl Benchmark {
    pub fn new(name: impl Into<String>, filter: Filter) -> Self {
        Self {
            name: name.into(),
            filter,
        }
    }
}

/// 소요 시간과 결과 값
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement<T> {
    pub duration: Duration,
    pub value: T,
}

/// count/fetch 측정 쌍
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub count: Measurement<u64>,
    pub fetch: Measurement<Vec<RawEvent>>,
}

impl BenchmarkResult {
    /// 측정 쌍 생성. count 값과 fetch 결과 길이가 다르면 `ConsistencyViolation`
    pub fn new(
        benchmark: &str,
        count: Measurement<u64>,
        fetch: Measurement<Vec<RawEvent>>,
    ) -> Result<Self, CoreError> {
        if count.value != fetch.value.len() as u64 {
            return Err(CoreError::ConsistencyViolation {
                benchmark: benchmark.to_string(),
                count: count.value,
                fetched: fetch.value.len(),
            });
        }
        Ok(Self { count, fetch })
    }

    /// 결과 카디널리티
    pub fn cardinality(&self) -> u64 {
        self.count.value
    }
}

/// 벤치마크 이름 → 결과 (완료 순서 유지)
///
/// 실행 도중에도 발행되므로 관찰자는 부분 완료 상태를 볼 수 있다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkRunResults {
    entries: Vec<(String, BenchmarkResult)>,
}

impl BenchmarkRunResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// 완료된 결과 추가. 같은 이름이 있으면 교체한다
    pub fn insert(&mut self, name: impl Into<String>, result: BenchmarkResult) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = result,
            None => self.entries.push((name, result)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&BenchmarkResult> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, result)| result)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 완료 순서대로 순회
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BenchmarkResult)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), r))
    }

    /// 시간 정보를 제외한 결과 요약 (이름 → (count, fetched ids))
    ///
    /// 실행 순서와 무관하게 비교할 때 사용한다.
    pub fn outcomes(&self) -> BTreeMap<String, (u64, Vec<String>)> {
        self.entries
            .iter()
            .map(|(name, result)| {
                let ids = result.fetch.value.iter().map(|e| e.id.clone()).collect();
                (name.clone(), (result.count.value, ids))
            })
            .collect()
    }
}
