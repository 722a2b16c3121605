use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// 追加写入 `<log_dir>/app.log` 的文件日志
pub struct Logger {
    file: Mutex<File>,
    level: LevelFilter,
}

impl Logger {
    pub fn new(log_path: &Path, level: LevelFilter) -> Result<Self, std::io::Error> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Logger {
            file: Mutex::new(file),
            level,
        })
    }

    /// 创建日志目录并安装为全局 logger，返回日志文件路径
    pub fn init(log_dir: &Path, level: LevelFilter) -> Result<PathBuf, Box<dyn std::error::Error>> {
        if !log_dir.exists() {
            fs::create_dir_all(log_dir)?;
        }
        let log_path = log_dir.join("app.log");
        let logger = Self::new(&log_path, level)?;
        log::set_boxed_logger(Box::new(logger))?;
        log::set_max_level(level);
        Ok(log_path)
    }

    fn format(record: &Record) -> String {
        format!(
            "[{}] [{}] [{}:{}] {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.file().unwrap_or("unknown"),
            record.line().unwrap_or(0),
            record.args()
        )
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if let Ok(mut file) = self.file.lock() {
                let _ = file.write_all(Self::format(record).as_bytes());
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn respects_level_and_writes_lines() {
        let path = std::env::temp_dir().join(format!("gate-log-{}.log", uuid::Uuid::new_v4()));
        let logger = Logger::new(&path, LevelFilter::Info).unwrap();

        let warn_meta = Metadata::builder().level(Level::Warn).build();
        let debug_meta = Metadata::builder().level(Level::Debug).build();
        assert!(logger.enabled(&warn_meta));
        assert!(!logger.enabled(&debug_meta));

        logger.log(
            &Record::builder()
                .args(format_args!("账户 a@x.com 已锁定"))
                .level(Level::Warn)
                .file(Some("gate.rs"))
                .line(Some(42))
                .build(),
        );
        logger.flush();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("[WARN] [gate.rs:42] 账户 a@x.com 已锁定"));
        let _ = fs::remove_file(&path);
    }
}
