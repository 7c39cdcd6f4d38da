//! 설정 로드/저장.
//!
//! 우선순위: 기본값 → 설정 파일(JSON/TOML) → `RELAYBENCH_*` 환경변수.
//! CLI 인자 오버라이드는 바이너리에서 마지막에 적용한다.

use config::{Config, Environment, File};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::error::CoreError;

/// 환경변수 접두사 (`RELAYBENCH_INGEST__TICK_INTERVAL_MS=500`)
const ENV_PREFIX: &str = "RELAYBENCH";

/// 설정 관리자
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: AppConfig,
}

impl ConfigManager {
    /// 설정 로드. 파일 경로가 주어지면 반드시 존재해야 한다
    pub fn load(config_path: Option<&Path>) -> Result<Self, CoreError> {
        let defaults = Config::try_from(&AppConfig::default_config())
            .map_err(|e| CoreError::Config(format!("기본 설정 변환 실패: {e}")))?;

        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
            debug!("설정 파일 추가: {}", path.display());
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| CoreError::Config(format!("설정 로드 실패: {e}")))?;

        config.validate()?;
        info!(
            "설정 로드 완료: source={}, tick={}ms",
            config.ingest.source_path.display(),
            config.ingest.tick_interval_ms
        );

        Ok(Self { config })
    }

    /// 현재 설정 반환 (복제본)
    pub fn get(&self) -> AppConfig {
        self.config.clone()
    }

    /// 기본 설정을 JSON 파일로 저장
    pub fn write_default(path: &Path) -> Result<(), CoreError> {
        Self::save_to_file(path, &AppConfig::default_config())
    }

    /// 파일에 설정 저장
    pub fn save_to_file(path: &Path, config: &AppConfig) -> Result<(), CoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                CoreError::Config(format!("설정 디렉토리 생성 실패: {}: {e}", parent.display()))
            })?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| CoreError::Config(format!("설정 직렬화 실패: {e}")))?;

        fs::write(path, content).map_err(|e| {
            CoreError::Config(format!("설정 파일 저장 실패: {}: {e}", path.display()))
        })?;

        info!("설정 파일 저장: {}", path.display());
        Ok(())
    }
}
