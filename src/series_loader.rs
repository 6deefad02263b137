use crate::{
    enums::SortBy,
    math::{Point3, Vec3},
    series::{GeometryError, SeriesGeometry},
};

use dicom::{
    core::{dictionary::DataDictionary, header::Header},
    dictionary_std::StandardDataDictionary,
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::tags;
use image::GrayImage;
use log::{debug, info, warn};
use ndarray::{Array2, s};
use rayon::prelude::*;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeriesLoaderError {
    #[error("No series with usable geometry found")]
    NoValidSeries,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub sort_by: SortBy,
    /// Decode the first frame of every slice into an 8-bit image.
    pub decode_images: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            sort_by: SortBy::default(),
            decode_images: true,
        }
    }
}

/// Geometry attributes read from a single DICOM object.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceAttributes {
    pub series_uid: String,
    pub series_description: String,
    pub row_direction: Vec3,
    pub col_direction: Vec3,
    pub origin: Point3,
    pub pixel_spacing: (f64, f64),
    pub width: u32,
    pub height: u32,
    pub slice_thickness: f64,
    pub instance_number: Option<i32>,
}

/// One slice of a loaded series, index-aligned with the series' slice origins.
#[derive(Debug, Clone)]
pub struct SliceEntry {
    pub path: PathBuf,
    pub origin: Point3,
    /// Patient z coordinate of the slice origin.
    pub slice_location: f64,
    pub instance_number: Option<i32>,
    /// `None` if decoding was disabled or failed.
    pub image: Option<GrayImage>,
}

#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub geometry: SeriesGeometry,
    pub description: String,
    pub slices: Vec<SliceEntry>,
}

struct ParsedSlice {
    path: PathBuf,
    attributes: SliceAttributes,
    image: Option<GrayImage>,
}

pub struct SeriesLoader;

impl SeriesLoader {
    /// Load every series found below a directory
    ///
    /// Files ending in ".dcm" and files without extension are considered,
    /// recursively. Files that cannot be read or lack geometry attributes are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be read or no series remains
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        options: LoadOptions,
    ) -> Result<Vec<LoadedSeries>, SeriesLoaderError> {
        let mut paths = Vec::new();
        Self::collect_candidate_files(path.as_ref(), &mut paths)?;
        paths.sort();

        if paths.is_empty() {
            return Err(SeriesLoaderError::NoValidSeries);
        }
        info!("Found {} candidate files in {}", paths.len(), path.as_ref().display());

        Self::load_from_file_paths(&paths, options)
    }

    /// Load series from file paths, in the given order
    pub fn load_from_file_paths(
        paths: &[impl AsRef<Path> + Sync],
        options: LoadOptions,
    ) -> Result<Vec<LoadedSeries>, SeriesLoaderError> {
        let objects: Vec<_> = paths
            .par_iter()
            .filter_map(|path| {
                let path = path.as_ref();
                match open_file(path) {
                    Ok(object) => Some((path.to_path_buf(), object)),
                    Err(err) => {
                        warn!("Skipping {}: {err}", path.display());
                        None
                    }
                }
            })
            .collect();

        Self::load_from_dicom_objects(&objects, options)
    }

    /// Group already opened DICOM objects into series
    ///
    /// # Arguments
    ///
    /// * `dicom_objects` - DICOM file objects paired with the path they came from
    /// * `options` - Slice ordering and image decoding
    ///
    /// # Errors
    ///
    /// Returns error if no object carries usable geometry
    pub fn load_from_dicom_objects(
        dicom_objects: &[(PathBuf, FileDicomObject<InMemDicomObject>)],
        options: LoadOptions,
    ) -> Result<Vec<LoadedSeries>, SeriesLoaderError> {
        let parsed: Vec<_> = dicom_objects
            .par_iter()
            .filter_map(|(path, dicom_object)| {
                let Some(attributes) = Self::extract_slice_attributes(dicom_object) else {
                    warn!("Skipping {}: missing geometry attributes", path.display());
                    return None;
                };
                let image = if options.decode_images {
                    Self::decode_image(path, dicom_object)
                } else {
                    None
                };
                Some(ParsedSlice {
                    path: path.clone(),
                    attributes,
                    image,
                })
            })
            .collect();

        let series = Self::group_slices(parsed, options.sort_by);
        if series.is_empty() {
            return Err(SeriesLoaderError::NoValidSeries);
        }
        info!("Loaded {} series", series.len());
        Ok(series)
    }

    /// Read the geometry attributes of one object, `None` if any is missing or unusable.
    pub fn extract_slice_attributes(dicom_object: &InMemDicomObject) -> Option<SliceAttributes> {
        let orientation = Self::multi_float(dicom_object, tags::IMAGE_ORIENTATION_PATIENT)
            .filter(|v| v.len() >= 6)?;
        let position = Self::multi_float(dicom_object, tags::IMAGE_POSITION_PATIENT)
            .filter(|v| v.len() >= 3)?;
        let spacing = Self::multi_float(dicom_object, tags::PIXEL_SPACING)
            .filter(|v| v.len() >= 2 && v[0] > 0.0 && v[1] > 0.0)?;

        let width = dicom_object.element(tags::COLUMNS).ok()?.to_int::<u32>().ok()?;
        let height = dicom_object.element(tags::ROWS).ok()?.to_int::<u32>().ok()?;
        if width == 0 || height == 0 {
            return None;
        }

        let series_uid = Self::text(dicom_object, tags::SERIES_INSTANCE_UID)
            .unwrap_or_else(|| "UnknownSeries".to_string());
        let series_description = Self::text(dicom_object, tags::SERIES_DESCRIPTION)
            .unwrap_or_else(|| format!("Series {series_uid}"));
        let slice_thickness = dicom_object
            .element(tags::SLICE_THICKNESS)
            .ok()
            .and_then(|e| e.to_float64().ok())
            .unwrap_or(1.0);
        let instance_number = dicom_object
            .element(tags::INSTANCE_NUMBER)
            .ok()
            .and_then(|e| e.to_int::<i32>().ok());

        Some(SliceAttributes {
            series_uid,
            series_description,
            row_direction: Vec3::new(orientation[0], orientation[1], orientation[2]),
            col_direction: Vec3::new(orientation[3], orientation[4], orientation[5]),
            origin: Point3::new(position[0], position[1], position[2]),
            pixel_spacing: (spacing[0], spacing[1]),
            width,
            height,
            slice_thickness,
            instance_number,
        })
    }

    /// "Name: value" lines for every top-level attribute of a file, pixel data excluded.
    pub fn describe_tags(path: impl AsRef<Path>) -> Result<Vec<String>, SeriesLoaderError> {
        let object = open_file(path.as_ref())?;
        let lines = object
            .iter()
            .filter(|element| element.tag() != tags::PIXEL_DATA)
            .map(|element| {
                let name = StandardDataDictionary
                    .by_tag(element.tag())
                    .map(|entry| entry.alias.to_string())
                    .unwrap_or_else(|| format!("{}", element.tag()));
                let value = element
                    .to_str()
                    .map(|v| Self::trim_padding(&v).to_string())
                    .unwrap_or_default();
                format!("{name}: {value}")
            })
            .collect();
        Ok(lines)
    }

    fn collect_candidate_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                Self::collect_candidate_files(&path, out)?;
            } else if path
                .extension()
                .and_then(|s| s.to_str())
                .is_none_or(|ext| ext.eq_ignore_ascii_case("dcm"))
            {
                out.push(path);
            }
        }
        Ok(())
    }

    fn group_slices(parsed: Vec<ParsedSlice>, sort_by: SortBy) -> Vec<LoadedSeries> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<ParsedSlice>> = HashMap::new();
        for slice in parsed {
            let uid = slice.attributes.series_uid.clone();
            if !groups.contains_key(&uid) {
                order.push(uid.clone());
            }
            groups.entry(uid).or_default().push(slice);
        }

        order
            .into_iter()
            .filter_map(|uid| {
                let slices = groups.remove(&uid)?;
                match Self::build_series(slices, sort_by) {
                    Ok(series) => Some(series),
                    Err(err) => {
                        warn!("Skipping series {uid}: {err}");
                        None
                    }
                }
            })
            .collect()
    }

    fn build_series(
        mut slices: Vec<ParsedSlice>,
        sort_by: SortBy,
    ) -> Result<LoadedSeries, SeriesLoaderError> {
        // Orientation, spacing and grid size are taken from the first slice.
        let first = slices
            .first()
            .map(|s| s.attributes.clone())
            .ok_or(GeometryError::EmptySeries)?;
        Self::sort_slices(&mut slices, &first, sort_by);

        let origins = slices.iter().map(|s| s.attributes.origin).collect();
        let geometry = SeriesGeometry::new(
            first.series_uid.clone(),
            first.row_direction,
            first.col_direction,
            first.pixel_spacing.0,
            first.pixel_spacing.1,
            first.width,
            first.height,
            origins,
        )?
        .with_slice_thickness(first.slice_thickness);
        debug!(
            "Series {} has {} slices, normal {:?}",
            first.series_uid,
            geometry.slice_count(),
            geometry.slice_normal()
        );

        let slices = slices
            .into_iter()
            .map(|s| SliceEntry {
                path: s.path,
                origin: s.attributes.origin,
                slice_location: s.attributes.origin.z,
                instance_number: s.attributes.instance_number,
                image: s.image,
            })
            .collect();

        Ok(LoadedSeries {
            geometry,
            description: first.series_description,
            slices,
        })
    }

    fn sort_slices(slices: &mut [ParsedSlice], first: &SliceAttributes, sort_by: SortBy) {
        match sort_by {
            SortBy::ImagePositionPatient => {
                let normal = first.row_direction.cross(&first.col_direction);
                let distance = |s: &ParsedSlice| s.attributes.origin.coords.dot(&normal);
                slices.sort_by(|a, b| {
                    distance(a)
                        .partial_cmp(&distance(b))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            }
            SortBy::InstanceNumber => {
                slices.sort_by_key(|s| s.attributes.instance_number.unwrap_or(i32::MAX));
            }
            SortBy::None => {}
        }
    }

    fn multi_float(dicom_object: &InMemDicomObject, tag: dicom::core::Tag) -> Option<Vec<f64>> {
        dicom_object.element(tag).ok()?.to_multi_float64().ok()
    }

    fn text(dicom_object: &InMemDicomObject, tag: dicom::core::Tag) -> Option<String> {
        dicom_object
            .element(tag)
            .ok()
            .and_then(|e| e.to_str().ok())
            .map(|v| Self::trim_padding(&v).to_string())
            .filter(|v| !v.is_empty())
    }

    // UI values are padded with NUL, text values with spaces.
    fn trim_padding(value: &str) -> &str {
        value.trim_matches(|c: char| c.is_whitespace() || c == '\0')
    }

    fn decode_image(
        path: &Path,
        dicom_object: &FileDicomObject<InMemDicomObject>,
    ) -> Option<GrayImage> {
        let decoded = dicom_object
            .decode_pixel_data()
            .and_then(|pixel_data| {
                let options = ConvertOptions::new().with_voi_lut(VoiLutOption::First);
                pixel_data.to_ndarray_with_options::<u16>(&options)
            })
            .map(|arr| arr.slice_move(s![0, .., .., 0]));

        match decoded {
            Ok(image_2d) => Self::to_gray_image(&image_2d),
            Err(err) => {
                warn!("No image for {}: {err}", path.display());
                None
            }
        }
    }

    /// Stretch the value range of a slice to 8 bits.
    fn to_gray_image(slice: &Array2<u16>) -> Option<GrayImage> {
        let (height, width) = slice.dim();
        let (min, max) = slice
            .iter()
            .fold((u16::MAX, u16::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let range = f32::from(max.saturating_sub(min)).max(1.0);
        let pixels = slice
            .iter()
            .map(|&v| ((f32::from(v - min) / range) * 255.0).round() as u8)
            .collect();
        GrayImage::from_raw(width as u32, height as u32, pixels)
    }
}
