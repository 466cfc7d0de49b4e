/*
 * Copyright (c) 2017, Alan Chen
 * See LICENCE file for BSD-2 terms
 */

//! read camera make/model/capture time out of image files

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str;

use chrono::{NaiveDate, NaiveDateTime};
use exif::{In, Tag, Value};
use thiserror::Error;

use crate::names::{normalize_make, normalize_model};

pub type DecodeError = Box<dyn std::error::Error>;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("cannot open: {0}")]
    Open(#[source] std::io::Error),

    #[error("cannot decode metadata: {0}")]
    Decode(DecodeError),
}

/// Tags as found in the file, nothing filled in yet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTags {
    pub make: Option<String>,
    pub model: Option<String>,
    pub capture_time: Option<NaiveDateTime>,
}

/// Decodes embedded tags from an opened file
pub trait MetadataDecoder {
    fn decode(&self, input: &mut BufReader<File>) -> Result<RawTags, DecodeError>;
}

/// Metadata used to build a destination name
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    pub make: String,
    pub model: String,
    pub capture_time: NaiveDateTime,
    /// uppercase, with the leading dot
    pub extension: String,
}

/// EXIF decoding via kamadak-exif, works on TIFF based raws, JPEG, HEIF, PNG, WebP
pub struct ExifDecoder;

impl MetadataDecoder for ExifDecoder {
    fn decode(&self, input: &mut BufReader<File>) -> Result<RawTags, DecodeError>
    {
        let exif = exif::Reader::new().read_from_container(input)?;

        let capture_time = datetime_field(&exif, Tag::DateTimeOriginal)
            .or_else(|| datetime_field(&exif, Tag::DateTime));

        Ok(RawTags {
            make: ascii_field(&exif, Tag::Make),
            model: ascii_field(&exif, Tag::Model),
            capture_time,
        })
    }
}

fn ascii_field(exif: &exif::Exif, tag: Tag) -> Option<String>
{
    let field = exif.get_field(tag, In::PRIMARY)?;
    match field.value {
        Value::Ascii(ref vec) if !vec.is_empty() => {
            str::from_utf8(&vec[0]).ok().map(String::from)
        }
        _ => None,
    }
}

fn datetime_field(exif: &exif::Exif, tag: Tag) -> Option<NaiveDateTime>
{
    let field = exif.get_field(tag, In::PRIMARY)?;
    let dt = match field.value {
        Value::Ascii(ref vec) if !vec.is_empty() => exif::DateTime::from_ascii(&vec[0]).ok()?,
        _ => return None,
    };

    NaiveDate::from_ymd_opt(i32::from(dt.year), u32::from(dt.month), u32::from(dt.day))?
        .and_hms_opt(u32::from(dt.hour), u32::from(dt.minute), u32::from(dt.second))
}

/// Read and normalize the metadata of one file. Errors mean "skip this file".
pub fn read_metadata<D>(decoder: &D, path: &Path) -> Result<MetadataRecord, MetadataError>
    where D: MetadataDecoder + ?Sized
{
    let file = File::open(path).map_err(MetadataError::Open)?;
    let mut input = BufReader::new(file);
    let tags = decoder.decode(&mut input).map_err(MetadataError::Decode)?;

    Ok(MetadataRecord {
        make: normalize_make(&or_unknown(tags.make, "Make")),
        model: normalize_model(&or_unknown(tags.model, "Model")),
        // NaiveDateTime::default() is the unix epoch
        capture_time: tags.capture_time.unwrap_or_default(),
        extension: upper_extension(path),
    })
}

fn or_unknown(value: Option<String>, field: &str) -> String
{
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => format!("Unknown-{}", field),
    }
}

fn upper_extension(path: &Path) -> String
{
    match path.extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy().to_uppercase()),
        None => String::new(),
    }
}
