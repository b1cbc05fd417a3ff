// (c) Meta Platforms, Inc. and affiliates.
//
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Destinations for the report, text or JSON alike. Every call writes one
//! complete line.

use std::convert::Infallible;
use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use unwrap_infallible::UnwrapInfallible;

#[async_trait]
pub trait Writer {
    async fn write(&self, s: &str) -> Result<(), io::Error>;
}

pub enum WriterType {
    // static dispatch for the known sinks
    Stdout(StdoutWriter),
    File(FileWriter),
    Buffer(BufferWriter),

    Custom(Box<dyn Writer + Send + Sync + 'static>),
}

impl WriterType {
    pub async fn write_line(&self, s: &str) -> Result<(), io::Error> {
        match self {
            WriterType::File(file) => file.write(s).await?,
            WriterType::Stdout(stdout) => stdout.write(s).await?,
            WriterType::Buffer(buffer) => buffer.write(s).await.unwrap_infallible(),

            WriterType::Custom(custom) => custom.write(s).await?,
        }
        Ok(())
    }
}

/// Appends to a report file, truncating it on creation.
pub struct FileWriter {
    file: Arc<Mutex<fs::File>>,
}

impl FileWriter {
    pub async fn create<P: AsRef<Path>>(path: P) -> Result<Self, io::Error> {
        let file = fs::File::create(path).await?;
        Ok(FileWriter {
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub async fn write(&self, s: &str) -> Result<(), io::Error> {
        let mut file = self.file.lock().await;
        file.write_all(s.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await
    }
}

/// Keeps every line in memory; used by embedders and tests.
#[derive(Debug)]
pub struct BufferWriter {
    buffer: Arc<Mutex<Vec<String>>>,
}

impl BufferWriter {
    pub fn new(buffer: Arc<Mutex<Vec<String>>>) -> Self {
        Self { buffer }
    }

    pub async fn write(&self, s: &str) -> Result<(), Infallible> {
        self.buffer.lock().await.push(s.to_string());
        Ok(())
    }
}

/// A closed stdout (say, piped into `head`) is an error, not a panic.
#[derive(Debug, Clone, Default)]
pub struct StdoutWriter {}

impl StdoutWriter {
    pub fn new() -> Self {
        StdoutWriter {}
    }

    pub async fn write(&self, s: &str) -> Result<(), io::Error> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(s.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await
    }
}
