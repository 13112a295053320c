//! Reading text corpora (plain, gzip, tar, zip) and learning them line by line,
//! in parallel across files and across the lines of big files.

use crate::pair::ChainPair;
use crate::tokenizer::tokenize;
use anyhow::Result;
use crossbeam_channel::unbounded;
use flate2::read::GzDecoder;
use log::{info, warn};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::thread;
use tar::Archive;
use zip::ZipArchive;

const LARGE_TEXT_LINES: usize = 20_000;
const CHUNK_LINES: usize = 1000;

/// Container a corpus file comes in, judged by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusFormat {
    Plain,
    Gzip,
    Tar,
    TarGzip,
    Zip,
}

impl CorpusFormat {
    pub fn of(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            CorpusFormat::TarGzip
        } else if name.ends_with(".tar") {
            CorpusFormat::Tar
        } else if name.ends_with(".zip") {
            CorpusFormat::Zip
        } else if name.ends_with(".gz") {
            CorpusFormat::Gzip
        } else {
            CorpusFormat::Plain
        }
    }
}

fn is_txt(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("txt"))
}

/// Files a directory walk should pick up: `.txt` documents and archives.
pub fn is_supported_corpus_file(path: &Path) -> bool {
    match CorpusFormat::of(path) {
        CorpusFormat::Plain => is_txt(path),
        _ => true,
    }
}

/// Chat logs are rarely clean UTF-8. Bad sequences become U+FFFD and every
/// other line of the document is kept.
fn decode_document(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    if text.trim().is_empty() {
        None
    } else {
        Some(text.into_owned())
    }
}

fn read_document<R: Read>(mut reader: R) -> io::Result<Option<String>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(decode_document(&bytes))
}

fn tar_documents<R: Read>(mut archive: Archive<R>) -> Result<Vec<String>> {
    let mut documents = Vec::new();
    for entry in archive.entries()? {
        let entry = entry?;
        if is_txt(&entry.path()?) {
            documents.extend(read_document(entry)?);
        }
    }
    Ok(documents)
}

fn zip_documents(mut archive: ZipArchive<File>) -> Result<Vec<String>> {
    let mut documents = Vec::new();
    for i in 0..archive.len() {
        let member = archive.by_index(i)?;
        if member.is_dir() || !is_txt(Path::new(member.name())) {
            continue;
        }
        documents.extend(read_document(member)?);
    }
    Ok(documents)
}

/// Every non-blank text document inside `path`. Archives contribute their
/// `.txt` members; a damaged archive fails the whole file.
pub fn read_corpus_texts(path: &Path) -> Result<Vec<String>> {
    let documents: Vec<String> = match CorpusFormat::of(path) {
        CorpusFormat::TarGzip => tar_documents(Archive::new(GzDecoder::new(File::open(path)?)))?,
        CorpusFormat::Tar => tar_documents(Archive::new(File::open(path)?))?,
        CorpusFormat::Zip => zip_documents(ZipArchive::new(File::open(path)?)?)?,
        CorpusFormat::Gzip => read_document(GzDecoder::new(File::open(path)?))?
            .into_iter()
            .collect(),
        CorpusFormat::Plain => decode_document(&fs::read(path)?).into_iter().collect(),
    };
    Ok(documents)
}

fn learn_lines(lines: &[&str]) -> (ChainPair, usize) {
    let mut pair = ChainPair::new();
    let mut learned = 0;
    for line in lines {
        let tokens = tokenize(line);
        if tokens.len() >= 2 {
            pair.learn(&tokens);
            learned += 1;
        }
    }
    (pair, learned)
}

/// Learn every line of `text` as its own message. Returns the pair and the
/// number of lines that taught it something.
pub fn learn_text(text: &str) -> (ChainPair, usize) {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= LARGE_TEXT_LINES {
        return learn_lines(&lines);
    }

    lines
        .par_chunks(CHUNK_LINES)
        .map(learn_lines)
        .reduce(
            || (ChainPair::new(), 0),
            |(mut a, a_lines), (b, b_lines)| {
                a.merge(b);
                (a, a_lines + b_lines)
            },
        )
}

/// Learn one corpus file (any supported format).
pub fn learn_file(path: &Path) -> Result<(ChainPair, usize)> {
    let mut pair = ChainPair::new();
    let mut learned = 0;
    for text in read_corpus_texts(path)? {
        let (part, lines) = learn_text(&text);
        pair.merge(part);
        learned += lines;
    }
    Ok((pair, learned))
}

pub struct TrainReport {
    pub pair: ChainPair,
    pub files: usize,
    pub lines: usize,
    pub failed: Vec<PathBuf>,
}

/// Learn many corpus files at once. Each worker builds a private pair per
/// file; the calling thread folds the results together.
pub fn bulk_train(paths: &[PathBuf], workers: usize) -> TrainReport {
    let workers = workers.max(1).min(paths.len().max(1));
    info!("[◐] Training on {} files with {} workers", paths.len(), workers);

    let (file_tx, file_rx) = unbounded::<PathBuf>();
    for path in paths {
        let _ = file_tx.send(path.clone());
    }
    drop(file_tx);

    let (pair_tx, pair_rx) = unbounded::<(PathBuf, Result<(ChainPair, usize)>)>();
    let mut handles = Vec::with_capacity(workers);
    for worker_id in 1..=workers {
        let rx = file_rx.clone();
        let tx = pair_tx.clone();
        handles.push(thread::spawn(move || {
            while let Ok(path) = rx.recv() {
                info!("[Thread {}] Processing: {}", worker_id, path.display());
                let learned = learn_file(&path);
                let _ = tx.send((path, learned));
            }
        }));
    }
    drop(pair_tx);

    let mut report = TrainReport {
        pair: ChainPair::new(),
        files: 0,
        lines: 0,
        failed: Vec::new(),
    };
    for (path, learned) in pair_rx {
        match learned {
            Ok((pair, lines)) => {
                report.pair.merge(pair);
                report.files += 1;
                report.lines += lines;
                info!("[✓] Learned {} lines from {}", lines, path.display());
            }
            Err(e) => {
                warn!("[!] Failed to learn {}: {}", path.display(), e);
                report.failed.push(path);
            }
        }
    }
    for handle in handles {
        let _ = handle.join();
    }

    info!(
        "[✓] Training complete: {} files, {} lines, {} contexts",
        report.files,
        report.lines,
        report.pair.forward.len()
    );
    report
}
