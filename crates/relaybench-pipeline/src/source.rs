//! 레코드 소스 구현.
//!
//! - [`FileRecordSource`]: 버퍼링된 비동기 JSONL 파일 리더
//! - [`LinesSource`]: 메모리 내 줄 목록 (테스트, 소규모 입력용)

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tracing::debug;

use relaybench_core::error::CoreError;
use relaybench_core::ports::source::RecordSource;

/// 읽기 버퍼 크기 (대용량 JSONL 순차 읽기)
const READ_BUFFER_BYTES: usize = 1024 * 1024;

/// JSONL 파일 소스
pub struct FileRecordSource {
    lines: Lines<BufReader<File>>,
}

impl FileRecordSource {
    /// 파일 열기
    pub async fn open(path: &Path) -> Result<Self, CoreError> {
        let file = File::open(path).await.map_err(|e| {
            CoreError::Io(std::io::Error::new(
                e.kind(),
                format!("입력 파일 열기 실패 ({}): {e}", path.display()),
            ))
        })?;
        debug!("입력 파일 열기: {}", path.display());
        Ok(Self {
            lines: BufReader::with_capacity(READ_BUFFER_BYTES, file).lines(),
        })
    }
}

#[async_trait]
impl RecordSource for FileRecordSource {
    async fn next_line(&mut self) -> Result<Option<String>, CoreError> {
        Ok(self.lines.next_line().await?)
    }
}

/// 메모리 내 줄 목록 소스
#[derive(Debug, Default, Clone)]
pub struct LinesSource {
    lines: VecDeque<String>,
}

impl LinesSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// 남은 줄 수
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[async_trait]
impl RecordSource for LinesSource {
    async fn next_line(&mut self) -> Result<Option<String>, CoreError> {
        Ok(self.lines.pop_front())
    }
}
