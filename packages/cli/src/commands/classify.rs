use super::read_content;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_editor::ContentKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Initial-content file, or a directory of them
    pub input: PathBuf,
}

pub fn classify(args: ClassifyArgs, _cwd: &str) -> Result<()> {
    let files = if args.input.is_dir() {
        find_content_files(&args.input)
    } else if args.input.is_file() {
        vec![args.input.clone()]
    } else {
        return Err(anyhow::anyhow!(
            "Input path does not exist: {}",
            args.input.display()
        ));
    };

    for file in &files {
        match read_content(file) {
            Ok(content) => {
                println!("  {} {}", label(content.kind()), file.display());
            }
            Err(e) => {
                println!("  {} {}: {}", "✗".red(), file.display(), e);
            }
        }
    }

    println!();
    println!("   Files classified: {}", files.len());
    Ok(())
}

fn label(kind: ContentKind) -> colored::ColoredString {
    let text = format!("{:<14}", kind.to_string());
    match kind {
        ContentKind::Empty => text.dimmed(),
        ContentKind::JsonSnapshot => text.green(),
        ContentKind::UpdateList => text.cyan(),
        ContentKind::UpdateBlob => text.yellow(),
    }
}

/// Find content files in a directory
fn find_content_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let ext = path.extension().and_then(|s| s.to_str());
        if matches!(ext, Some("json") | Some("b64") | Some("txt")) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    files
}
