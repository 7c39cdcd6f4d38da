//! 기본 이벤트 검증기.
//!
//! 필드 형식(hex 길이)과 ID 해시를 확인한다.
//! 서명(Schnorr) 검증은 하지 않는다.

use relaybench_core::error::CoreError;
use relaybench_core::models::event::Event;
use relaybench_core::ports::verifier::Verifier;

const ID_HEX_LEN: usize = 64;
const PUBKEY_HEX_LEN: usize = 64;
const SIG_HEX_LEN: usize = 128;

/// ID 해시 재계산 검증기
#[derive(Debug, Default, Clone, Copy)]
pub struct EventIdVerifier;

impl EventIdVerifier {
    pub fn new() -> Self {
        Self
    }
}

fn check_hex(event: &Event, field: &str, value: &str, len: usize) -> Result<(), CoreError> {
    if value.len() != len || hex::decode(value).is_err() {
        return Err(CoreError::Verification {
            id: event.id.clone(),
            reason: format!("{field}는 {len}자 hex여야 합니다 (길이 {})", value.len()),
        });
    }
    Ok(())
}

impl Verifier for EventIdVerifier {
    fn verify(&self, event: &Event) -> Result<(), CoreError> {
        check_hex(event, "id", &event.id, ID_HEX_LEN)?;
        check_hex(event, "pubkey", &event.pubkey, PUBKEY_HEX_LEN)?;
        check_hex(event, "sig", &event.sig, SIG_HEX_LEN)?;

        if !event.id_matches()? {
            return Err(CoreError::Verification {
                id: event.id.clone(),
                reason: "ID 해시 불일치".to_string(),
            });
        }
        Ok(())
    }
}
