//! Planning and running file conversions.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use schem2nbt_convert::{convert_with, ConvertOptions};
use tokio::fs;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::error::CliError;

/// One input file and where its structure goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub converted: usize,
    pub failed: usize,
}

/// `<dir>/<stem>.nbt`, where `dir` defaults to the input's own directory.
pub fn output_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let file = input.with_extension("nbt");
    match (out_dir, file.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => file,
    }
}

/// Work out the jobs for a run and create output directories.
pub async fn plan(input: &Path, output: Option<&Path>, folder: bool) -> Result<Vec<Job>, CliError> {
    if !folder {
        let meta = fs::metadata(input).await.map_err(|e| CliError::io(input, e))?;
        if meta.is_dir() {
            return Err(CliError::io(
                input,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "is a directory, pass --folder to convert its contents",
                ),
            ));
        }
        let out = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| output_path(input, None));
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CliError::io(parent, e))?;
        }
        return Ok(vec![Job {
            input: input.to_path_buf(),
            output: out,
        }]);
    }

    let meta = fs::metadata(input).await.map_err(|e| CliError::io(input, e))?;
    if !meta.is_dir() {
        return Err(CliError::io(
            input,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }
    let out_dir = output.unwrap_or(input);
    fs::create_dir_all(out_dir)
        .await
        .map_err(|e| CliError::io(out_dir, e))?;

    let mut entries = fs::read_dir(input).await.map_err(|e| CliError::io(input, e))?;
    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| CliError::io(input, e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| CliError::io(entry.path(), e))?;
        if file_type.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    let mut jobs = Vec::with_capacity(files.len());
    let mut taken = HashSet::new();
    for path in files {
        let out = output_path(&path, Some(out_dir));
        if out == path {
            warn!("skipping {}: it would overwrite itself", path.display());
            continue;
        }
        if !taken.insert(out.clone()) {
            warn!(
                "skipping {}: {} is already written by another input",
                path.display(),
                out.display()
            );
            continue;
        }
        jobs.push(Job {
            input: path,
            output: out,
        });
    }
    debug!("planned {} conversions in {}", jobs.len(), input.display());
    Ok(jobs)
}

/// Read, convert on the blocking pool, write.
pub async fn convert_file(job: &Job, options: Arc<ConvertOptions>) -> Result<usize, CliError> {
    let input = fs::read(&job.input)
        .await
        .map_err(|e| CliError::io(&job.input, e))?;
    let bytes = tokio::task::spawn_blocking(move || convert_with(&input, &options)).await??;
    fs::write(&job.output, &bytes)
        .await
        .map_err(|e| CliError::io(&job.output, e))?;
    Ok(bytes.len())
}

/// Convert every job with at most `workers` conversions in flight.
///
/// A failing file is logged and counted; it never stops the others.
pub async fn run_all(jobs: Vec<Job>, options: ConvertOptions, workers: usize) -> Summary {
    let total = jobs.len();
    let options = Arc::new(options);
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));

    let mut handles = Vec::with_capacity(total);
    for job in jobs {
        let options = Arc::clone(&options);
        let semaphore = Arc::clone(&semaphore);
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let result = convert_file(&job, options).await;
            (job, result)
        }));
    }

    let mut summary = Summary::default();
    for handle in handles {
        match handle.await {
            Ok((job, Ok(size))) => {
                summary.converted += 1;
                info!(
                    "converted {}/{}: {} -> {} ({size} bytes)",
                    summary.converted,
                    total,
                    job.input.display(),
                    job.output.display()
                );
            }
            Ok((job, Err(e))) => {
                summary.failed += 1;
                error!("failed to convert {}: {e}", job.input.display());
            }
            Err(e) => {
                summary.failed += 1;
                error!("conversion task panicked: {e}");
            }
        }
    }
    summary
}
