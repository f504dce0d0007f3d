//! GPX 1.1 waypoint output with Locus Map icon extensions.

use crate::poi::AnnotatedPoi;

use chrono::{DateTime, TimeZone};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";
const LOCUS_NAMESPACE: &str = "http://www.locusmap.eu";
const ICON_ARCHIVE: &str = "OpenStreetMapPOI-icons.zip";

#[derive(Debug, Error)]
pub enum GpxError {
    #[error("could not write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not serialise waypoints: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// `YYYY-MM-DD-HH-MM-SS.gpx` for the given instant.
pub fn gpx_file_name<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    now.format("%Y-%m-%d-%H-%M-%S.gpx").to_string()
}

// Debug formatting keeps a decimal point on whole degrees ("40.0")
fn format_coord(value: f64) -> String {
    format!("{:?}", value)
}

// CDATA cannot contain "]]>", so the text is cut between "]]" and ">" and
// emitted as consecutive sections.
fn cdata_sections(text: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find("]]>") {
        sections.push(&rest[..pos + 2]);
        rest = &rest[pos + 2..];
    }
    sections.push(rest);
    sections
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn write_waypoint<W: Write>(
    writer: &mut Writer<W>,
    poi: &AnnotatedPoi,
) -> Result<(), quick_xml::Error> {
    let lat = format_coord(poi.poi.lat);
    let lon = format_coord(poi.poi.lon);
    let wpt = BytesStart::new("wpt").with_attributes([("lat", lat.as_str()), ("lon", lon.as_str())]);
    writer.write_event(Event::Start(wpt))?;

    write_text_element(writer, "name", &poi.name)?;
    write_text_element(writer, "sym", &poi.icon)?;

    writer.write_event(Event::Start(BytesStart::new("extensions")))?;
    let icon_ref = format!("file:{}:{}.png", ICON_ARCHIVE, poi.icon);
    write_text_element(writer, "locus:icon", &icon_ref)?;
    writer.write_event(Event::End(BytesEnd::new("extensions")))?;

    writer.write_event(Event::Start(BytesStart::new("desc")))?;
    for section in cdata_sections(&poi.desc) {
        writer.write_event(Event::CData(BytesCData::new(section)))?;
    }
    writer.write_event(Event::End(BytesEnd::new("desc")))?;

    writer.write_event(Event::End(BytesEnd::new("wpt")))?;
    Ok(())
}

/// Serialises `pois` as a GPX document into `inner`, one `<wpt>` per POI in
/// input order, and hands `inner` back.
pub fn write_gpx<W: Write>(inner: W, pois: &[AnnotatedPoi]) -> Result<W, quick_xml::Error> {
    let mut writer = Writer::new_with_indent(inner, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), Some("yes"))))?;
    let gpx = BytesStart::new("gpx").with_attributes([
        ("version", "1.1"),
        ("xmlns", GPX_NAMESPACE),
        ("xmlns:locus", LOCUS_NAMESPACE),
    ]);
    writer.write_event(Event::Start(gpx))?;
    for poi in pois {
        write_waypoint(&mut writer, poi)?;
    }
    writer.write_event(Event::End(BytesEnd::new("gpx")))?;

    Ok(writer.into_inner())
}

/// Writes a new timestamp-named GPX file into `data_dir`. An existing file of
/// the same name is left alone and reported as an error.
pub fn save_gpx<Tz>(
    data_dir: &Path,
    now: &DateTime<Tz>,
    pois: &[AnnotatedPoi],
) -> Result<PathBuf, GpxError>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let path = data_dir.join(gpx_file_name(now));
    let io_err = |source: io::Error| GpxError::Io {
        path: path.clone(),
        source,
    };

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(io_err)?;

    let written = write_gpx(BufWriter::new(file), pois)
        .map_err(GpxError::from)
        .and_then(|mut buf| buf.flush().map_err(io_err));

    if let Err(err) = written {
        // Do not leave a truncated document behind
        let _ = std::fs::remove_file(&path);
        return Err(err);
    }

    log::debug!("wrote {} waypoints to {:?}", pois.len(), path);
    Ok(path)
}
