/// Archive persistence
///
/// A save dialog gets the first say on where the archive goes. When no dialog is
/// available, or writing to the chosen path fails, the archive lands in the
/// download directory instead.

use super::SubmitError;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Outcome of asking where to save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveChoice {
    /// Save here; a directory means "inside, under the suggested name"
    Path(PathBuf),
    /// The user backed out
    Cancelled,
    /// No dialog on this platform; use the download directory
    Unsupported,
}

/// A user-directed "save as" flow
#[async_trait::async_trait]
pub trait SaveDialog: Send + Sync {
    async fn choose(&self, suggested_name: &str) -> SaveChoice;
}

/// Always falls back to the download directory
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDialog;

#[async_trait::async_trait]
impl SaveDialog for NoDialog {
    async fn choose(&self, _suggested_name: &str) -> SaveChoice {
        SaveChoice::Unsupported
    }
}

/// Pre-selected target, e.g. from `--output`
#[derive(Debug, Clone)]
pub struct SaveTo(pub PathBuf);

#[async_trait::async_trait]
impl SaveDialog for SaveTo {
    async fn choose(&self, _suggested_name: &str) -> SaveChoice {
        SaveChoice::Path(self.0.clone())
    }
}

/// Terminal prompt. Empty answer keeps the suggested name, `q` or EOF cancels.
///
/// Stdin is read on the blocking pool so the runtime keeps serving other tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptDialog;

#[async_trait::async_trait]
impl SaveDialog for PromptDialog {
    async fn choose(&self, suggested_name: &str) -> SaveChoice {
        let suggested = suggested_name.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            let mut stdout = std::io::stdout();
            if write!(stdout, "Save archive as [{suggested}] (q to cancel): ")
                .and_then(|_| stdout.flush())
                .is_err()
            {
                return SaveChoice::Unsupported;
            }
            read_choice(&mut std::io::stdin().lock(), &suggested)
        })
        .await;

        answer.unwrap_or_else(|e| {
            tracing::warn!("⚠️ Save prompt failed: {}", e);
            SaveChoice::Unsupported
        })
    }
}

/// Turn one line of prompt input into a choice
fn read_choice(input: &mut impl BufRead, suggested_name: &str) -> SaveChoice {
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(0) => SaveChoice::Cancelled,
        Ok(_) => match answer.trim() {
            "q" | "Q" => SaveChoice::Cancelled,
            "" => SaveChoice::Path(PathBuf::from(suggested_name)),
            path => SaveChoice::Path(PathBuf::from(path)),
        },
        Err(_) => SaveChoice::Unsupported,
    }
}

/// `<projectName>.zip`, or the default stem when the name is missing or blank
pub fn archive_filename(project_name: Option<&str>) -> String {
    let stem = project_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(super::DEFAULT_ARCHIVE_STEM);
    format!("{}.zip", stem.replace(['/', '\\'], "_"))
}

/// Write `bytes` where the dialog says, falling back to `download_dir/filename`
pub async fn save_archive(
    bytes: &[u8],
    filename: &str,
    dialog: &dyn SaveDialog,
    download_dir: &Path,
) -> Result<PathBuf, SubmitError> {
    match dialog.choose(filename).await {
        SaveChoice::Cancelled => return Err(SubmitError::Cancelled),
        SaveChoice::Unsupported => {}
        SaveChoice::Path(chosen) => {
            let target = match tokio::fs::metadata(&chosen).await {
                Ok(meta) if meta.is_dir() => chosen.join(filename),
                _ => chosen,
            };
            match tokio::fs::write(&target, bytes).await {
                Ok(()) => return Ok(target),
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Save to {} failed ({}), falling back to download directory",
                        target.display(),
                        e
                    );
                }
            }
        }
    }

    tokio::fs::create_dir_all(download_dir).await?;
    let target = download_dir.join(filename);
    tokio::fs::write(&target, bytes).await?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Cancel;

    #[async_trait::async_trait]
    impl SaveDialog for Cancel {
        async fn choose(&self, _suggested_name: &str) -> SaveChoice {
            SaveChoice::Cancelled
        }
    }

    #[test]
    fn test_archive_filename() {
        assert_eq!(archive_filename(Some("my-op")), "my-op.zip");
        assert_eq!(archive_filename(Some("  ")), "operator-sdk-project.zip");
        assert_eq!(archive_filename(None), "operator-sdk-project.zip");
        assert_eq!(archive_filename(Some("../evil")), ".._evil.zip");
    }

    #[test]
    fn test_prompt_answers() {
        let mut blank = std::io::Cursor::new("\n");
        assert_eq!(read_choice(&mut blank, "op.zip"), SaveChoice::Path(PathBuf::from("op.zip")));
        let mut typed = std::io::Cursor::new("  /tmp/out.zip \n");
        assert_eq!(read_choice(&mut typed, "op.zip"), SaveChoice::Path(PathBuf::from("/tmp/out.zip")));
        let mut quit = std::io::Cursor::new("q\n");
        assert_eq!(read_choice(&mut quit, "op.zip"), SaveChoice::Cancelled);
        let mut eof = std::io::Cursor::new("");
        assert_eq!(read_choice(&mut eof, "op.zip"), SaveChoice::Cancelled);
    }

    #[tokio::test]
    async fn test_no_dialog_uses_download_dir() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = dir.path().join("downloads");
        let path = save_archive(b"PK", "a.zip", &NoDialog, &downloads).await.unwrap();
        assert_eq!(path, downloads.join("a.zip"));
        assert_eq!(std::fs::read(path).unwrap(), b"PK");
    }

    #[tokio::test]
    async fn test_directory_choice_uses_suggested_name() {
        let dir = tempfile::tempdir().unwrap();
        let dialog = SaveTo(dir.path().to_path_buf());
        let path = save_archive(b"PK", "b.zip", &dialog, Path::new("unused")).await.unwrap();
        assert_eq!(path, dir.path().join("b.zip"));
    }

    #[tokio::test]
    async fn test_failed_save_as_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let dialog = SaveTo(dir.path().join("missing").join("c.zip"));
        let path = save_archive(b"PK", "c.zip", &dialog, dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("c.zip"));
    }

    #[tokio::test]
    async fn test_cancel_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let result = save_archive(b"PK", "d.zip", &Cancel, dir.path()).await;
        assert!(matches!(result, Err(SubmitError::Cancelled)));
        assert!(!dir.path().join("d.zip").exists());
    }
}
