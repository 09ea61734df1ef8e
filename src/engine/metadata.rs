// src/engine/metadata.rs
//
// EXIF metadata extraction via kamadak-exif.
// Reads camera, exposure and GPS fields from JPEG, TIFF, PNG and WebP
// containers without decoding any pixels.

use crate::engine::common::EngineResult;
use crate::error::RasterError;
use exif::{Exif, In, Reader, Tag, Value};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::Path;

/// Decimal-degree position from the GPS IFD. Altitude is in metres, negative
/// below sea level, and 0 when the tag is absent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GpsPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl GpsPosition {
    /// Degrees, minutes and seconds with hemisphere letters,
    /// e.g. `35°41'22.2"N 139°41'30.1"E`.
    pub fn dms(&self) -> String {
        format_dms(self.latitude, self.longitude)
    }

    pub fn map_url(&self) -> String {
        format!(
            "https://maps.google.com/?q={:.6},{:.6}",
            self.latitude, self.longitude
        )
    }
}

/// Fields read from an image's EXIF block. Every field is optional; zero or
/// negative readings are treated as absent, the same way cameras use them
/// as "unknown".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageMetadata {
    pub make: Option<String>,
    pub model: Option<String>,
    pub software: Option<String>,
    pub datetime: Option<String>,
    pub datetime_original: Option<String>,
    pub datetime_digitized: Option<String>,
    pub description: Option<String>,
    pub copyright: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub bits_per_sample: Option<u32>,
    pub orientation: Option<u32>,
    /// Exposure time in seconds.
    pub exposure: Option<f64>,
    /// F-number.
    pub aperture: Option<f64>,
    pub iso: Option<u32>,
    /// Focal length in millimetres.
    pub focal_length: Option<f64>,
    pub focal_length_35mm: Option<u32>,
    /// Raw flash bitfield; bit 0 is "fired".
    pub flash: Option<u32>,
    pub metering_mode: Option<u32>,
    /// Subject distance in metres.
    pub subject_distance: Option<f64>,
    pub exposure_bias: Option<f64>,
    /// Present unless both coordinates are zero.
    pub gps: Option<GpsPosition>,
}

impl ImageMetadata {
    pub fn from_exif(exif: &Exif) -> Self {
        let latitude = coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, 'S').unwrap_or(0.0);
        let longitude = coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, 'W').unwrap_or(0.0);
        let gps = (latitude != 0.0 || longitude != 0.0).then(|| {
            let altitude = real(exif, Tag::GPSAltitude).unwrap_or(0.0);
            let below = uint(exif, Tag::GPSAltitudeRef) == Some(1);
            GpsPosition {
                latitude,
                longitude,
                altitude: if below { -altitude } else { altitude },
            }
        });

        Self {
            make: ascii(exif, Tag::Make),
            model: ascii(exif, Tag::Model),
            software: ascii(exif, Tag::Software),
            datetime: ascii(exif, Tag::DateTime),
            datetime_original: ascii(exif, Tag::DateTimeOriginal),
            datetime_digitized: ascii(exif, Tag::DateTimeDigitized),
            description: ascii(exif, Tag::ImageDescription),
            copyright: ascii(exif, Tag::Copyright),
            width: positive(uint(exif, Tag::PixelXDimension).or_else(|| uint(exif, Tag::ImageWidth))),
            height: positive(uint(exif, Tag::PixelYDimension).or_else(|| uint(exif, Tag::ImageLength))),
            bits_per_sample: positive(uint(exif, Tag::BitsPerSample)),
            orientation: positive(uint(exif, Tag::Orientation)),
            exposure: real(exif, Tag::ExposureTime).filter(|&v| v > 0.0),
            aperture: real(exif, Tag::FNumber).filter(|&v| v > 0.0),
            iso: positive(uint(exif, Tag::PhotographicSensitivity)),
            focal_length: real(exif, Tag::FocalLength).filter(|&v| v > 0.0),
            focal_length_35mm: positive(uint(exif, Tag::FocalLengthIn35mmFilm)),
            flash: uint(exif, Tag::Flash),
            metering_mode: uint(exif, Tag::MeteringMode),
            subject_distance: real(exif, Tag::SubjectDistance).filter(|&v| v >= 0.0),
            exposure_bias: real(exif, Tag::ExposureBiasValue).filter(|&v| v != 0.0),
            gps,
        }
    }

    /// Shutter speed as photographers write it: `1/250` below a second,
    /// `2.5` otherwise.
    pub fn exposure_label(&self) -> Option<String> {
        self.exposure.map(format_exposure)
    }

    pub fn aperture_label(&self) -> Option<String> {
        self.aperture.map(|f| format!("f/{f:.1}"))
    }

    pub fn focal_length_label(&self) -> Option<String> {
        self.focal_length.map(|mm| format!("{mm:.1} mm"))
    }

    pub fn flash_fired(&self) -> Option<bool> {
        self.flash.map(|bits| bits & 0x1 != 0)
    }
}

/// Read EXIF metadata from the file at `path`.
///
/// A missing file is `FileNotFound`; a file without a readable EXIF block
/// is `MetadataNotFound`.
pub fn read_metadata(path: &Path) -> EngineResult<ImageMetadata> {
    let display = path.to_string_lossy().to_string();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RasterError::file_not_found(display.clone())
        } else {
            RasterError::file_read_failed(display.clone(), e)
        }
    })?;
    from_container(&mut BufReader::new(file), display)
}

/// Read EXIF metadata from an in-memory encoded image.
pub fn read_metadata_bytes(data: &[u8]) -> EngineResult<ImageMetadata> {
    from_container(&mut Cursor::new(data), "<memory>".to_string())
}

fn from_container<R: BufRead + Seek>(reader: &mut R, display: String) -> EngineResult<ImageMetadata> {
    match Reader::new().read_from_container(reader) {
        Ok(exif) => Ok(ImageMetadata::from_exif(&exif)),
        Err(e) => {
            let source = display.as_str();
            tracing::debug!(source = %source, error = %e, "no usable EXIF block");
            Err(RasterError::metadata_not_found(display))
        }
    }
}

/// `exposure` seconds as `1/N` (rounded) below one second, else one decimal.
pub fn format_exposure(seconds: f64) -> String {
    if seconds < 1.0 {
        format!("1/{}", (1.0 / seconds + 0.5) as i32)
    } else {
        format!("{seconds:.1}")
    }
}

/// Latitude and longitude as `D°M'S.s"H D°M'S.s"H`. Degrees and minutes
/// are truncated, seconds keep one decimal.
pub fn format_dms(latitude: f64, longitude: f64) -> String {
    let hemisphere = |v: f64, pos: char, neg: char| if v >= 0.0 { pos } else { neg };
    let (lat_d, lat_m, lat_s) = split_degrees(latitude);
    let (lon_d, lon_m, lon_s) = split_degrees(longitude);
    format!(
        "{lat_d}°{lat_m}'{lat_s:.1}\"{} {lon_d}°{lon_m}'{lon_s:.1}\"{}",
        hemisphere(latitude, 'N', 'S'),
        hemisphere(longitude, 'E', 'W'),
    )
}

fn split_degrees(value: f64) -> (i32, i32, f64) {
    let value = value.abs();
    let degrees = value as i32;
    let minutes = ((value - f64::from(degrees)) * 60.0) as i32;
    let seconds = ((value - f64::from(degrees)) * 60.0 - f64::from(minutes)) * 60.0;
    (degrees, minutes, seconds)
}

fn ascii(exif: &Exif, tag: Tag) -> Option<String> {
    let Value::Ascii(parts) = &exif.get_field(tag, In::PRIMARY)?.value else {
        return None;
    };
    let text = parts
        .iter()
        .map(|p| String::from_utf8_lossy(p).trim_end_matches('\0').trim().to_string())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

fn uint(exif: &Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)?.value.get_uint(0)
}

fn real(exif: &Exif, tag: Tag) -> Option<f64> {
    let value = match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(v) => v.first()?.to_f64(),
        Value::SRational(v) => v.first()?.to_f64(),
        other => f64::from(other.get_uint(0)?),
    };
    value.is_finite().then_some(value)
}

fn positive(value: Option<u32>) -> Option<u32> {
    value.filter(|&v| v > 0)
}

/// Degrees + minutes/60 + seconds/3600, negated when the reference tag
/// starts with `negative`.
fn coordinate(exif: &Exif, tag: Tag, ref_tag: Tag, negative: char) -> Option<f64> {
    let Value::Rational(parts) = &exif.get_field(tag, In::PRIMARY)?.value else {
        return None;
    };
    if parts.len() < 3 {
        return None;
    }
    let value = parts[0].to_f64() + parts[1].to_f64() / 60.0 + parts[2].to_f64() / 3600.0;
    if !value.is_finite() {
        return None;
    }
    let flipped = ascii(exif, ref_tag).is_some_and(|r| r.starts_with(negative));
    Some(if flipped { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use exif::experimental::Writer;
    use exif::{Field, Rational, SRational};

    fn field(tag: Tag, value: Value) -> Field {
        Field {
            tag,
            ifd_num: In::PRIMARY,
            value,
        }
    }

    fn text(s: &str) -> Value {
        Value::Ascii(vec![s.as_bytes().to_vec()])
    }

    fn ratio(num: u32, denom: u32) -> Rational {
        Rational { num, denom }
    }

    fn tiff(fields: &[Field]) -> Vec<u8> {
        let mut writer = Writer::new();
        for f in fields {
            writer.push_field(f);
        }
        let mut out = Cursor::new(Vec::new());
        writer.write(&mut out, false).unwrap();
        out.into_inner()
    }

    fn parse(fields: &[Field]) -> ImageMetadata {
        let exif = Reader::new().read_raw(tiff(fields)).unwrap();
        ImageMetadata::from_exif(&exif)
    }

    #[test]
    fn camera_and_exposure_fields() {
        let meta = parse(&[
            field(Tag::Make, text("Canon")),
            field(Tag::Model, text("EOS 5D")),
            field(Tag::Software, text("fw 1.1")),
            field(Tag::Orientation, Value::Short(vec![6])),
            field(Tag::ExposureTime, Value::Rational(vec![ratio(1, 250)])),
            field(Tag::FNumber, Value::Rational(vec![ratio(28, 10)])),
            field(Tag::PhotographicSensitivity, Value::Short(vec![400])),
            field(Tag::FocalLength, Value::Rational(vec![ratio(50, 1)])),
            field(Tag::Flash, Value::Short(vec![0x19])),
            field(
                Tag::ExposureBiasValue,
                Value::SRational(vec![SRational { num: -1, denom: 3 }]),
            ),
        ]);

        assert_eq!(meta.make.as_deref(), Some("Canon"));
        assert_eq!(meta.model.as_deref(), Some("EOS 5D"));
        assert_eq!(meta.software.as_deref(), Some("fw 1.1"));
        assert_eq!(meta.orientation, Some(6));
        assert_eq!(meta.iso, Some(400));
        assert_eq!(meta.exposure_label().as_deref(), Some("1/250"));
        assert_eq!(meta.aperture_label().as_deref(), Some("f/2.8"));
        assert_eq!(meta.focal_length_label().as_deref(), Some("50.0 mm"));
        assert_eq!(meta.flash_fired(), Some(true));
        assert!((meta.exposure_bias.unwrap() + 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(meta.gps, None);
        assert_eq!(meta.copyright, None);
    }

    #[test]
    fn gps_position_and_dms() {
        let meta = parse(&[
            field(Tag::GPSLatitudeRef, text("S")),
            field(
                Tag::GPSLatitude,
                Value::Rational(vec![ratio(35, 1), ratio(41, 1), ratio(222, 10)]),
            ),
            field(Tag::GPSLongitudeRef, text("E")),
            field(
                Tag::GPSLongitude,
                Value::Rational(vec![ratio(139, 1), ratio(41, 1), ratio(3012, 100)]),
            ),
            field(Tag::GPSAltitudeRef, Value::Byte(vec![1])),
            field(Tag::GPSAltitude, Value::Rational(vec![ratio(12, 1)])),
        ]);

        let gps = meta.gps.unwrap();
        assert!((gps.latitude + 35.6895).abs() < 1e-9);
        assert!((gps.longitude - 139.6917).abs() < 1e-9);
        assert_eq!(gps.altitude, -12.0);
        assert_eq!(gps.dms(), "35°41'22.2\"S 139°41'30.1\"E");
        assert_eq!(gps.map_url(), "https://maps.google.com/?q=-35.689500,139.691700");
    }

    #[test]
    fn zero_readings_are_absent() {
        let meta = parse(&[
            field(Tag::Make, text("")),
            field(Tag::ExposureTime, Value::Rational(vec![ratio(0, 1)])),
            field(Tag::PhotographicSensitivity, Value::Short(vec![0])),
            field(
                Tag::GPSLatitude,
                Value::Rational(vec![ratio(0, 1), ratio(0, 1), ratio(0, 1)]),
            ),
        ]);
        assert_eq!(meta, ImageMetadata::default());
    }

    #[test]
    fn exposure_and_dms_formatting() {
        assert_eq!(format_exposure(1.0 / 60.0), "1/60");
        assert_eq!(format_exposure(2.5), "2.5");
        assert_eq!(format_exposure(1.0), "1.0");
        assert_eq!(format_dms(-33.8568, -151.2153), "33°51'24.5\"S 151°12'55.1\"W");
        assert_eq!(format_dms(51.5, 0.0), "51°30'0.0\"N 0°0'0.0\"E");
    }

    #[test]
    fn image_without_exif_is_reported() {
        let png = crate::engine::encode_to_vec(
            &crate::engine::PixelBuffer::new(4, 4, 3).unwrap(),
            crate::ops::OutputFormat::Png,
        )
        .unwrap();
        let err = read_metadata_bytes(&png).unwrap_err();
        assert!(matches!(err, RasterError::MetadataNotFound { .. }));
    }
}
