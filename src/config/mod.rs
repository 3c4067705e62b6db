//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GapwatchConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//!
//! On reload signal:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of Arc<GapwatchConfig>
//!     → subsystems observe new config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AnalysisConfig, CorrelationConfig, CustomFormatConfig, GapwatchConfig, HttpConfig,
    IngestionConfig, InventoryConfig, ObservabilityConfig, ParserConfig, PoolConfig,
    RetentionConfig, VolumeThresholds,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
