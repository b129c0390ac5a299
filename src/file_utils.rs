use anyhow::{anyhow, Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::elan::{ElanDocument, ExportOptions, ImportOptions, ImportSummary};

// @module: File and directory utilities

// @const: Extension of ELAN annotation files
pub const EAF_EXTENSION: &str = "eaf";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @generates: Output path next to the input with a marker before the extension
    // @params: input_file, output_dir, marker, extension
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        marker: &str,
        extension: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let output_dir = output_dir.as_ref();

        let stem = input_file.file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push('.');
        output_filename.push_str(marker);
        output_filename.push('.');
        output_filename.push_str(extension);

        output_dir.join(output_filename)
    }

    /// Find files with a specific extension in a directory
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        let wanted = extension.trim_start_matches('.');

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(wanted) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Detect whether a file holds an ELAN annotation document
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow!("File does not exist: {:?}", path));
        }

        if let Some(ext) = path.extension() {
            if ext.to_string_lossy().eq_ignore_ascii_case(EAF_EXTENSION) {
                return Ok(FileType::Eaf);
            }
        }

        // Fall back to examining file contents
        if let Ok(content) = fs::read_to_string(path) {
            if content.contains("<ANNOTATION_DOCUMENT") {
                return Ok(FileType::Eaf);
            }
        }

        Ok(FileType::Unknown)
    }

    /// Read and import an EAF file into a fresh document
    pub fn load_document<P: AsRef<Path>>(path: P, options: &ImportOptions) -> Result<(ElanDocument, ImportSummary)> {
        let path = path.as_ref();
        let content = Self::read_to_string(path)?;

        let mut doc = ElanDocument::new();
        let summary = doc
            .import_str(&content, options)
            .with_context(|| format!("Failed to import EAF file: {:?}", path))?;

        debug!("Loaded {:?}: {} tiers, {} annotations", path, summary.tiers_added, summary.annotations_added);
        Ok((doc, summary))
    }

    /// Export a document and write it to disk
    pub fn save_document<P: AsRef<Path>>(doc: &ElanDocument, path: P, options: &ExportOptions) -> Result<()> {
        let xml = doc
            .export_xml_with(options)
            .with_context(|| format!("Failed to export EAF for: {:?}", path.as_ref()))?;
        Self::write_to_file(path, &xml)
    }
}

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// ELAN annotation document
    Eaf,
    /// Unknown file type
    Unknown,
}
