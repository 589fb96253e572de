//! dankloader walks a file or directory and uploads everything it finds
//! through a dank gateway's assign + upload flow.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use dank_client::Client;

#[derive(Parser)]
#[command(name = "dankloader", about = "Bulk uploader for a dank gateway")]
struct Args {
    /// address:port of the dank instance to upload to
    #[arg(long, default_value = "127.0.0.1:8333")]
    dank_addr: String,

    /// Number of concurrent uploads
    #[arg(long, default_value_t = 4)]
    concurrent: usize,

    /// File or directory to upload
    path: PathBuf,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Expand a path into the list of files to upload.
fn collect_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(path) {
        let entry = entry.with_context(|| format!("read {}", path.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let files = collect_files(&args.path)?;
    if files.is_empty() {
        anyhow::bail!("nothing to upload under {}", args.path.display());
    }

    let client = Arc::new(Client::new(args.dank_addr));
    let semaphore = Arc::new(Semaphore::new(args.concurrent.max(1)));
    let mut uploads = JoinSet::new();

    for path in files {
        let client = client.clone();
        let semaphore = semaphore.clone();
        uploads.spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
            let filename = client
                .upload_file(&path, None)
                .await
                .with_context(|| format!("error uploading {}", path.display()))?;
            println!("{} => {}", path.display(), filename);
            Ok::<_, anyhow::Error>(())
        });
    }

    // first failure terminates the run with a non-zero exit
    while let Some(result) = uploads.join_next().await {
        result.context("upload task panicked")??;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("one.txt");
        fs::write(&file, b"x").unwrap();

        let files = collect_files(&file).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_collect_directory_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("b.txt"), b"b").unwrap();

        let mut files = collect_files(dir.path()).unwrap();
        files.sort();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.txt"));
        assert!(files[1].ends_with("b.txt"));
    }
}
