//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了缓存值的编解码方式。

use crate::error::{Result, SyncError};
use crate::model::Record;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// 记录编解码器
///
/// 缓存值为记录的JSON表示，可选gzip压缩。解码时根据魔数自动识别是否压缩，
/// 切换压缩配置不会让已有缓存条目失效。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordCodec {
    #[default]
    Json,
    GzipJson,
}

impl RecordCodec {
    pub fn new(compress: bool) -> Self {
        if compress {
            RecordCodec::GzipJson
        } else {
            RecordCodec::Json
        }
    }

    /// 编码记录
    pub fn encode(&self, record: &Record) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(record).map_err(|e| SyncError::Serialization(e.to_string()))?;
        match self {
            RecordCodec::Json => Ok(json),
            RecordCodec::GzipJson => compress(&json),
        }
    }

    /// 解码记录
    pub fn decode(&self, data: &[u8]) -> Result<Record> {
        if data.starts_with(&GZIP_MAGIC) {
            let json = decompress(data)?;
            return serde_json::from_slice(&json)
                .map_err(|e| SyncError::Serialization(e.to_string()));
        }
        serde_json::from_slice(data).map_err(|e| SyncError::Serialization(e.to_string()))
    }
}

#[cfg(feature = "flate2")]
fn compress(json: &[u8]) -> Result<Vec<u8>> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
    encoder
        .write_all(json)
        .map_err(|e| SyncError::Serialization(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| SyncError::Serialization(e.to_string()))
}

#[cfg(not(feature = "flate2"))]
fn compress(json: &[u8]) -> Result<Vec<u8>> {
    Ok(json.to_vec())
}

#[cfg(feature = "flate2")]
fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let mut decoder = GzDecoder::new(data);
    let mut decoded = Vec::new();
    decoder
        .read_to_end(&mut decoded)
        .map_err(|e| SyncError::Serialization(e.to_string()))?;
    Ok(decoded)
}

#[cfg(not(feature = "flate2"))]
fn decompress(_data: &[u8]) -> Result<Vec<u8>> {
    Err(SyncError::Serialization(
        "compressed cache value but flate2 feature is disabled".to_string(),
    ))
}
