/*
 * Copyright (c) 2017, Alan Chen
 * See LICENCE file for BSD-2 terms
 */

//! destination names from a `%` template

use chrono::{Datelike, NaiveDateTime};

use crate::metadata::MetadataRecord;

/// Manufacturer/Model/Date/Date_Time_Manufacturer_Model.extension,
/// e.g. Fujifilm/X100/2023-01-01/2023-01-01_120000_Fujifilm_X100.RAF
pub const DEFAULT_FORMAT: &str = "%K/%L/%D/%D_%t_%K_%L%e";

/// help text for the template placeholders
pub const PLACEHOLDER_HELP: &str = "Filename format options:
    %D - Date (yyyy-mm-dd)
    %t - Time (HHMMSS)
    %y - Year (yyyy)
    %m - Month (mm)
    %d - Day (dd)
    %K - Make
    %L - Model
    %e - Extension (.NEF, .JPG, ...)";

/// Fill the template with the record's fields. `%` always eats the next
/// character; unknown placeholders expand to nothing.
pub fn format_filename(format: &str, rec: &MetadataRecord) -> String
{
    let mut out = String::with_capacity(format.len() * 2);
    let mut chars = format.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('K') => out.push_str(&rec.make),
            Some('L') => out.push_str(&rec.model),
            Some(letter) => push_field(&mut out, letter, &rec.capture_time, &rec.extension),
            None => (),
        }
    }
    out
}

fn push_field(out: &mut String, letter: char, tm: &NaiveDateTime, ext: &str)
{
    match letter {
        'D' => out.push_str(&tm.format("%Y-%m-%d").to_string()),
        // no colons, they break smb mounted drives
        't' => out.push_str(&tm.format("%H%M%S").to_string()),
        'y' => out.push_str(&format!("{:04}", tm.year())),
        'm' => out.push_str(&format!("{:02}", tm.month())),
        'd' => out.push_str(&format!("{:02}", tm.day())),
        'e' => out.push_str(ext),
        _ => (),
    }
}
