use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use env_logger::{Builder, Env, Target};

/// Copies every log record to stderr and to a file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// `<dir>/facerange-<unix-seconds>.log`
pub fn log_file_path(dir: &Path) -> PathBuf {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    dir.join(format!("facerange-{secs}.log"))
}

/// Initialises `env_logger` with `info` as the default filter.
///
/// Records look like `2024-05-01T10:00:00.123Z [INFO] [src/main.rs:42] ...`.
/// When `log_dir` is given they are also written to a fresh timestamped file
/// in it, whose path is returned.
pub fn init(log_dir: Option<&Path>) -> io::Result<Option<PathBuf>> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} [{}] [{}:{}] {}",
            buf.timestamp_millis(),
            record.level(),
            record.file().unwrap_or("?"),
            record.line().unwrap_or(0),
            record.args()
        )
    });

    let log_path = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let path = log_file_path(dir);
            let file = File::create(&path)?;
            builder.target(Target::Pipe(Box::new(Tee { file })));
            Some(path)
        }
        None => None,
    };

    // Fails only if a logger is already installed.
    let _ = builder.try_init();
    Ok(log_path)
}
