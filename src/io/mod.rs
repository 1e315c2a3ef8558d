//! BAM file I/O utilities
//!
//! This module provides the output sink for retained duplicate sets and reads
//! the MI tag from both lazy and buffered alignment records.

use anyhow::{Context, Result};
use bstr::BString;
use noodles::bam;
use noodles::bgzf::io::Writer as BgzfWriter;
use noodles::sam::alignment::io::Write as SamWrite;
use noodles::sam::alignment::record::data::field::{Tag, Value};
use noodles::sam::alignment::record_buf::RecordBuf;
use noodles::sam::alignment::record_buf::data::field::Value as BufValue;
use noodles::sam::header::Header as SamHeader;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::algorithm::ReadSink;
use crate::duplicate_set::MolecularTagged;
use crate::error::DownsampleError;

/// Molecular identifier tag written by UMI grouping tools
pub const MI_TAG: Tag = Tag::new(b'M', b'I');

fn unsupported_mi_type() -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        "MI tag must be a string or an integer",
    )
}

fn name_or_unknown(name: Option<&bstr::BStr>) -> String {
    name.map(|n| n.to_string())
        .unwrap_or_else(|| "<unknown>".to_string())
}

impl MolecularTagged for bam::Record {
    fn molecular_id(&self) -> io::Result<Option<BString>> {
        let value = match self.data().get(MI_TAG.as_ref()).transpose()? {
            Some(value) => value,
            None => return Ok(None),
        };
        let id = match value {
            Value::String(s) => BString::from(s.to_vec()),
            Value::Int8(n) => BString::from(n.to_string()),
            Value::UInt8(n) => BString::from(n.to_string()),
            Value::Int16(n) => BString::from(n.to_string()),
            Value::UInt16(n) => BString::from(n.to_string()),
            Value::Int32(n) => BString::from(n.to_string()),
            Value::UInt32(n) => BString::from(n.to_string()),
            _ => return Err(unsupported_mi_type()),
        };
        Ok(Some(id))
    }

    fn read_name(&self) -> String {
        name_or_unknown(self.name())
    }
}

impl MolecularTagged for RecordBuf {
    fn molecular_id(&self) -> io::Result<Option<BString>> {
        let id = match self.data().get(&MI_TAG) {
            None => return Ok(None),
            Some(BufValue::String(s)) => s.clone(),
            Some(BufValue::Int8(n)) => BString::from(n.to_string()),
            Some(BufValue::UInt8(n)) => BString::from(n.to_string()),
            Some(BufValue::Int16(n)) => BString::from(n.to_string()),
            Some(BufValue::UInt16(n)) => BString::from(n.to_string()),
            Some(BufValue::Int32(n)) => BString::from(n.to_string()),
            Some(BufValue::UInt32(n)) => BString::from(n.to_string()),
            Some(_) => return Err(unsupported_mi_type()),
        };
        Ok(Some(id))
    }

    fn read_name(&self) -> String {
        name_or_unknown(self.name())
    }
}

/// Encode `header` as BAM and flush it as its own BGZF block
fn write_header<W: Write>(writer: &mut BgzfWriter<W>, header: &SamHeader) -> io::Result<()> {
    let mut encoded = Vec::new();
    bam::io::Writer::from(&mut encoded).write_header(header)?;
    writer.write_all(&encoded)?;
    writer.flush()
}

/// BGZF-compressed BAM output for retained duplicate sets
///
/// A whole set is encoded into one buffer and handed to the BGZF writer with a
/// single `write_all`, so an encoding failure never leaves half a set behind.
pub struct BamSink<W: Write = File> {
    writer: BgzfWriter<W>,
    header: SamHeader,
    buf: Vec<u8>,
}

impl BamSink<File> {
    /// Create the output file and write `header` to it
    pub fn create<P: AsRef<Path>>(path: P, header: SamHeader) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("failed to create output BAM {}", path.display()))?;
        Self::new(file, header)
            .with_context(|| format!("failed to write header to {}", path.display()))
    }
}

impl<W: Write> BamSink<W> {
    /// Wrap `inner` and write `header` to it
    pub fn new(inner: W, header: SamHeader) -> Result<Self> {
        let mut writer = BgzfWriter::new(inner);
        write_header(&mut writer, &header).map_err(DownsampleError::SinkWrite)?;
        Ok(Self {
            writer,
            header,
            buf: Vec::new(),
        })
    }

    /// Flush remaining blocks and write the BGZF EOF marker
    pub fn finish(self) -> Result<(), DownsampleError> {
        self.writer
            .finish()
            .map(drop)
            .map_err(DownsampleError::SinkWrite)
    }
}

impl<W: Write> ReadSink<bam::Record> for BamSink<W> {
    fn write_reads(&mut self, reads: &[bam::Record]) -> io::Result<()> {
        self.buf.clear();
        {
            let mut encoder = bam::io::Writer::from(&mut self.buf);
            for read in reads {
                encoder.write_alignment_record(&self.header, read)?;
            }
        }
        self.writer.write_all(&self.buf)
    }
}
