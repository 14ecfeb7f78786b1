//! Bundle successful batch results into one zip download.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use toolbench_core::envelope::ResultEnvelope;
use toolbench_core::naming::unique_name;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use crate::error::AppError;

/// MIME type of the archive response.
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Download name of the archive.
pub const ARCHIVE_FILE_NAME: &str = "compressed-images.zip";

/// Write every envelope as one zip entry named after its `output_name`.
///
/// Colliding names get a numeric suffix before the extension
/// (`photo.png`, `photo-1.png`, ...). Entries are stored uncompressed;
/// the payloads are already compressed images.
pub fn build_archive<'a, I>(envelopes: I) -> Result<Vec<u8>, AppError>
where
    I: IntoIterator<Item = &'a ResultEnvelope>,
{
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut used = HashSet::new();

    for envelope in envelopes {
        let name = unique_name(&envelope.output_name, &mut used);
        writer.start_file(name, options).map_err(archive_error)?;
        writer
            .write_all(&envelope.output_payload)
            .map_err(archive_error)?;
    }

    let cursor = writer.finish().map_err(archive_error)?;
    Ok(cursor.into_inner())
}

fn archive_error(e: impl std::fmt::Display) -> AppError {
    AppError::InternalError(format!("Failed to write archive: {e}"))
}
