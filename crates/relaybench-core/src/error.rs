//! relaybench 핵심 에러 타입.
//!
//! 모든 crate는 이 에러 타입을 그대로 반환한다.
//! 벤치마크 도구이므로 재시도나 부분 복구 없이 즉시 실패(fail-fast)한다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 레코드 파싱 실패 (JSON 구조 또는 필드 형식 오류)
    #[error("레코드 파싱 실패: {0}")]
    Parse(String),

    /// 레코드 검증 실패 (ID 해시 불일치, 서명 형식 오류 등)
    #[error("레코드 검증 실패 ({id}): {reason}")]
    Verification {
        /// 검증 실패한 이벤트 ID
        id: String,
        /// 실패 사유
        reason: String,
    },

    /// count 결과와 fetch 결과 길이가 다름 (저장소 일관성 버그)
    #[error("일관성 위반 ({benchmark}): count={count}, fetched={fetched}")]
    ConsistencyViolation {
        /// 벤치마크 이름
        benchmark: String,
        /// count 연산 결과
        count: u64,
        /// fetch 연산이 반환한 레코드 수
        fetched: usize,
    },

    /// 저장소 I/O 실패 (insert/count/query/크기 측정/유지보수)
    #[error("저장소 에러: {0}")]
    StoreIo(String),

    /// 상태 머신에서 허용되지 않는 전이
    #[error("잘못된 상태 전이: {0}")]
    InvalidState(String),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 단일 레코드 단위 에러인지 여부 (건너뛰기 정책 대상)
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            CoreError::Parse(_) | CoreError::Verification { .. } | CoreError::Serialization(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_errors_are_classified() {
        assert!(CoreError::Parse("bad".to_string()).is_record_error());
        assert!(CoreError::Verification {
            id: "abc".to_string(),
            reason: "id mismatch".to_string(),
        }
        .is_record_error());
        assert!(!CoreError::StoreIo("disk full".to_string()).is_record_error());
        assert!(!CoreError::ConsistencyViolation {
            benchmark: "Follows".to_string(),
            count: 2,
            fetched: 1,
        }
        .is_record_error());
    }

    #[test]
    fn consistency_message_names_benchmark() {
        let err = CoreError::ConsistencyViolation {
            benchmark: "Followers".to_string(),
            count: 10,
            fetched: 9,
        };
        let msg = err.to_string();
        assert!(msg.contains("Followers"));
        assert!(msg.contains("count=10"));
        assert!(msg.contains("fetched=9"));
    }
}
