use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use crate::error::RecorderError;
use crate::models::TradeRecord;

const HEADER: [&str; 4] = ["datetime", "action", "price", "volume"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only sink for executed trades
pub trait TradeRecorder: Send {
    fn record(&mut self, trade: &TradeRecord) -> Result<(), RecorderError>;
}

/// CSV trade history
///
/// The file is opened in append mode for every record, so external readers
/// always see complete rows. The header is written only when the file is new.
pub struct CsvTradeRecorder {
    path: PathBuf,
}

impl CsvTradeRecorder {
    /// Open (or create) the history file, creating parent directories
    ///
    /// # Example
    /// ```no_run
    /// use autotrader::persistence::CsvTradeRecorder;
    ///
    /// let recorder = CsvTradeRecorder::open("logs/trade_history.csv")?;
    /// # Ok::<(), autotrader::error::RecorderError>(())
    /// ```
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RecorderError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        if !path.exists() {
            let mut writer = csv::Writer::from_path(&path)?;
            writer.write_record(HEADER)?;
            writer.flush()?;
            tracing::info!("Created trade history at {}", path.display());
        }

        Ok(Self { path })
    }
}

impl TradeRecorder for CsvTradeRecorder {
    fn record(&mut self, trade: &TradeRecord) -> Result<(), RecorderError> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        writer.write_record([
            trade.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            trade.action.to_string(),
            trade.price.to_string(),
            trade.volume.to_string(),
        ])?;
        writer.flush()?;
        Ok(())
    }
}
