pub mod settings;

pub use settings::{
    AppSettings, DatabaseSettings, ProcurementSettings, Settings, SmtpSettings, StorageSettings,
};
