//! Newest-artifact selection from a remote directory listing.
//!
//! Filenames follow `<job_name>-<YYYYMMDD>_<HHMMSS>.log`. Because the
//! timestamp suffix is fixed-width and zero-padded, the lexicographically
//! maximal filename is also the chronologically latest one, so no timestamp
//! parsing is needed. The flip side: a file that breaks the convention
//! (missing timestamp, different width) silently wins or loses the
//! comparison. Known limitation; we do not attempt convention-sniffing.

/// Pick the latest artifact from a directory listing.
///
/// Returns `None` for an empty listing; the pipeline records that job as
/// failed with `NoArtifactFound`.
pub fn latest(listing: &[String]) -> Option<&String> {
    listing.iter().max()
}
