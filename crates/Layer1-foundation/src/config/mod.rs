//! Config - 통합 설정 관리
//!
//! - `uilint.rs` - UilintConfig 통합 설정

mod uilint;

pub use uilint::{UilintConfig, ENV_MANIFEST, ENV_SERVER_URL, UILINT_CONFIG_FILE};
