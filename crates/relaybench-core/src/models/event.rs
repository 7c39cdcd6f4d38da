//! 이벤트 모델 및 코덱.
//!
//! 입력 파일의 한 줄은 NIP-01 형식 이벤트 하나(JSON 객체)이다.
//! 파싱, ID 계산, 레코드 종류 분류를 담당한다.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// NIP-01 이벤트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// 이벤트 ID (직렬화된 커밋먼트의 SHA-256, 소문자 hex 64자)
    pub id: String,
    /// 작성자 공개키 (hex 64자)
    pub pubkey: String,
    /// 생성 시각 (unix seconds)
    pub created_at: i64,
    /// 이벤트 종류
    pub kind: u32,
    /// 태그 목록
    pub tags: Vec<Vec<String>>,
    /// 본문
    pub content: String,
    /// 서명 (hex 128자)
    pub sig: String,
}

impl Event {
    /// JSON 한 줄을 이벤트로 파싱
    pub fn from_json(line: &str) -> Result<Self, CoreError> {
        serde_json::from_str(line).map_err(|e| CoreError::Parse(e.to_string()))
    }

    /// 이벤트를 JSON으로 직렬화
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// 필드로부터 ID를 계산해 이벤트 생성 (테스트 데이터, 도구용)
    pub fn build(
        pubkey: impl Into<String>,
        created_at: i64,
        kind: u32,
        tags: Vec<Vec<String>>,
        content: impl Into<String>,
        sig: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let pubkey = pubkey.into();
        let content = content.into();
        let id = Self::compute_id(&pubkey, created_at, kind, &tags, &content)?;
        Ok(Self {
            id,
            pubkey,
            created_at,
            kind,
            tags,
            content,
            sig: sig.into(),
        })
    }

    /// NIP-01 ID 계산: `sha256([0, pubkey, created_at, kind, tags, content])`
    pub fn compute_id(
        pubkey: &str,
        created_at: i64,
        kind: u32,
        tags: &[Vec<String>],
        content: &str,
    ) -> Result<String, CoreError> {
        let commitment = serde_json::to_string(&(0u8, pubkey, created_at, kind, tags, content))?;
        Ok(hex::encode(Sha256::digest(commitment.as_bytes())))
    }

    /// 저장된 ID가 내용과 일치하는지 확인
    pub fn id_matches(&self) -> Result<bool, CoreError> {
        let expected = Self::compute_id(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        )?;
        Ok(expected == self.id)
    }

    /// 단일 문자 태그 (이름, 값) 목록: 저장소 태그 인덱스 대상
    pub fn indexable_tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().filter_map(|tag| match tag.as_slice() {
            [name, value, ..] if name.chars().count() == 1 => Some((name.as_str(), value.as_str())),
            _ => None,
        })
    }

    /// 메트릭 분류용 레코드 종류
    pub fn record_kind(&self) -> Option<RecordKind> {
        RecordKind::classify(self.kind)
    }
}

/// 메트릭 집계용 레코드 분류 (상호 배타적)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// 팔로우 목록 (kind 3)
    FollowList,
    /// 뮤트 목록 (kind 10000)
    MuteList,
    /// 신고 (kind 1984)
    Report,
}

impl RecordKind {
    pub const FOLLOW_LIST_KIND: u32 = 3;
    pub const MUTE_LIST_KIND: u32 = 10_000;
    pub const REPORT_KIND: u32 = 1984;

    /// 이벤트 kind 값으로 분류. 해당 없으면 `None`
    pub fn classify(kind: u32) -> Option<Self> {
        match kind {
            Self::FOLLOW_LIST_KIND => Some(Self::FollowList),
            Self::MUTE_LIST_KIND => Some(Self::MuteList),
            Self::REPORT_KIND => Some(Self::Report),
            _ => None,
        }
    }

    /// 대응하는 이벤트 kind 값
    pub fn kind(self) -> u32 {
        match self {
            Self::FollowList => Self::FOLLOW_LIST_KIND,
            Self::MuteList => Self::MUTE_LIST_KIND,
            Self::Report => Self::REPORT_KIND,
        }
    }
}

/// 저장소 조회 결과 (원본 JSON 보존)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: String,
    pub kind: u32,
    pub created_at: i64,
    /// 저장 당시의 원본 JSON
    pub json: String,
}
