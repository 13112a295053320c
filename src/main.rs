use anyhow::Result;
use chainchat::corpus::{bulk_train, is_supported_corpus_file};
use chainchat::{
    bootstrap_brain, prioritise, render, tokenize, BotConfig, ChainPair, FileStore, ModelStore,
    NounVocabulary, Reply, Session,
};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Bidirectional Markov chatter", long_about = None)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Overrides {
    /// TOML file with bot settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Bot nickname; also names the stored models
    #[arg(long, global = true)]
    name: Option<String>,
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    nouns: Option<PathBuf>,
    #[arg(long, global = true)]
    seed_file: Option<PathBuf>,
    #[arg(long, global = true)]
    respond_probability: Option<f64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chat on stdin; every line is a message from --user
    Talk {
        #[arg(long, default_value = "user")]
        user: String,
        /// Save the models when the session ends
        #[arg(long)]
        autosave: bool,
    },
    /// Learn corpus files or directories into the stored models
    Train {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Print one reply built around the given words
    Generate {
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// Show model sizes
    Stats,
}

impl Overrides {
    fn resolve(&self) -> Result<BotConfig> {
        let mut config = match &self.config {
            Some(path) => BotConfig::load(path)?,
            None => BotConfig::default(),
        };
        if let Some(name) = &self.name {
            config.identity = name.clone();
        }
        if let Some(dir) = &self.model_dir {
            config.model_dir = dir.clone();
        }
        if let Some(nouns) = &self.nouns {
            config.noun_file = nouns.clone();
        }
        if let Some(seed) = &self.seed_file {
            config.seed_file = seed.clone();
        }
        if let Some(p) = self.respond_probability {
            config.respond_probability = p;
        }
        config.validate()?;
        Ok(config)
    }
}

fn expand_corpus_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in fs::read_dir(path)? {
                let entry_path = entry?.path();
                if entry_path.is_file() && is_supported_corpus_file(&entry_path) {
                    files.push(entry_path);
                }
            }
        } else {
            files.push(path.clone());
        }
    }
    files.sort();
    Ok(files)
}

fn open_session(config: BotConfig) -> Session {
    let store: Arc<dyn ModelStore> = Arc::new(FileStore::new(config.model_dir.clone()));
    let nouns = Arc::new(NounVocabulary::load(&config.noun_file));
    let brain = bootstrap_brain(store.as_ref(), &config).into_shared();
    Session::new(brain, nouns, store, config)
}

fn talk(config: BotConfig, user: &str, autosave: bool) -> Result<()> {
    let mut session = open_session(config);
    println!("Talk mode. Type /exit to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "/exit" || trimmed == "/quit" {
            break;
        }

        if let Reply::Say(reply) = session.handle_message(user, trimmed) {
            println!("<{}> {}", session.config().identity, reply);
        }
    }

    if autosave {
        session.save()?;
    }
    Ok(())
}

fn train(config: BotConfig, paths: &[PathBuf], workers: Option<usize>) -> Result<()> {
    let files = expand_corpus_paths(paths)?;
    if files.is_empty() {
        anyhow::bail!("No corpus files found");
    }

    let store = FileStore::new(config.model_dir.clone());
    let mut pair = ChainPair::load(&store, &config.identity).pair;
    let workers = workers.unwrap_or_else(rayon::current_num_threads);
    let report = bulk_train(&files, workers);
    if report.files == 0 {
        anyhow::bail!("Every corpus file failed to load");
    }

    pair.merge(report.pair);
    pair.save(&store, &config.identity)?;
    info!(
        "[✓] {} now knows {} contexts",
        config.identity,
        pair.forward.len()
    );
    Ok(())
}

fn generate(config: BotConfig, words: &[String]) -> Result<()> {
    let tokens = tokenize(&words.join(" "));
    let mut session = open_session(config);
    let priority = prioritise(&tokens, session.nouns());

    match session.respond(&priority) {
        Ok(reply) => println!("{}", render(&reply)),
        Err(e) if e.is_silence() => println!("No possible responses."),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn stats(config: BotConfig) -> Result<()> {
    let store = FileStore::new(config.model_dir.clone());
    let loaded = ChainPair::load(&store, &config.identity);
    if !loaded.restored {
        println!("No stored models for {} in {}", config.identity, store.dir().display());
        return Ok(());
    }
    let pair = loaded.pair;
    println!("Identity: {}", config.identity);
    println!(
        "Forward: {} contexts, {} transitions",
        pair.forward.len(),
        pair.forward.total_weight()
    );
    println!(
        "Reverse: {} contexts, {} transitions",
        pair.reverse.len(),
        pair.reverse.total_weight()
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.overrides.resolve()?;

    match cli.command {
        Command::Talk { user, autosave } => talk(config, &user, autosave),
        Command::Train { paths, workers } => train(config, &paths, workers),
        Command::Generate { words } => generate(config, &words),
        Command::Stats => stats(config),
    }
}
