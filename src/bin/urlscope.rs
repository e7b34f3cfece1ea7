use anyhow::Context;
use clap::Parser;
use rayon::prelude::*;
use regex::Regex;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use urlscope::engine::{EngineConfig, PatternEngine};
use urlscope::format::{clusters, ClusterOut, Format};

fn init_parallelism() {
    static START: Once = Once::new();
    START.call_once(|| {
        let n = num_cpus::get();
        let _ = rayon::ThreadPoolBuilder::new().num_threads(n).build_global();
    });
}

#[derive(Parser, Debug)]
#[command(name = "urlscope", version, about = "Mine generalized structural patterns from a stream of URLs")]
struct Cli {
    /// Input files (`-` for stdin). May be repeated.
    #[arg(required = false)]
    input: Vec<String>,

    /// Output format: pattern | cluster | json
    #[arg(long = "format", short = 'F', default_value = "json")]
    format: String,

    /// Keep only clusters with at least this many distinct URLs
    #[arg(long = "min-count")]
    min_count: Option<u64>,

    /// Keep only clusters whose pattern matches this regex
    #[arg(long = "match")]
    match_re: Option<String>,

    /// Drop clusters whose pattern matches this regex
    #[arg(long = "exclude")]
    exclude_re: Option<String>,

    /// Max sample URLs retained per cluster
    #[arg(long = "max-samples", default_value_t = 8)]
    max_samples: usize,

    /// Distinct same-signature literals required before siblings fold
    #[arg(long = "min-cluster", default_value_t = 3)]
    min_cluster: usize,

    /// Literal fan-out that forces same-signature siblings to fold
    #[arg(long = "max-fanout", default_value_t = 64)]
    max_fanout: usize,

    /// Abort on the first invalid URL instead of skipping it
    #[arg(long = "fail-fast", default_value_t = false)]
    fail_fast: bool,
}

#[derive(Debug, Default)]
struct LoadStatus {
    all: u64,
    valid: u64,
    invalid: u64,
    uniq: u64,
}

impl LoadStatus {
    fn log(&self, stage: &str) {
        eprintln!(
            "[{stage}] all={} valid={} invalid={} uniq={}",
            self.all, self.valid, self.invalid, self.uniq
        );
    }
}

fn load_reader<R: BufRead>(
    reader: R,
    engine: &mut PatternEngine,
    status: &mut LoadStatus,
    running: &AtomicBool,
    fail_fast: bool,
) -> anyhow::Result<()> {
    for line in reader.lines() {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        let line = line?;
        let url = line.trim();
        if url.is_empty() {
            continue;
        }
        status.all += 1;
        match engine.load(url) {
            Ok(first_seen) => {
                status.valid += 1;
                if first_seen {
                    status.uniq += 1;
                }
            }
            Err(e) => {
                status.invalid += 1;
                if fail_fast {
                    return Err(e).with_context(|| format!("invalid url: {url}"));
                }
                eprintln!("[skip] {e}: {url}");
            }
        }
        if status.all % 5000 == 0 {
            status.log("loading");
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_parallelism();
    let cli = Cli::parse();

    let format = Format::parse(&cli.format)
        .ok_or_else(|| anyhow::anyhow!("unknown format: {}", cli.format))?;
    let match_re = cli
        .match_re
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("invalid --match regex")?;
    let exclude_re = cli
        .exclude_re
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("invalid --exclude regex")?;

    let input_files = if cli.input.is_empty() {
        if atty::is(atty::Stream::Stdin) {
            anyhow::bail!("no input; pipe URLs on stdin or pass files");
        }
        vec!["-".to_string()]
    } else {
        cli.input.clone()
    };

    let running = Arc::new(AtomicBool::new(true));
    {
        let r = running.clone();
        let _ = ctrlc::set_handler(move || {
            r.store(false, Ordering::SeqCst);
        });
    }

    let mut engine = PatternEngine::with_config(EngineConfig {
        max_samples: cli.max_samples,
        min_cluster: cli.min_cluster,
        max_fanout: cli.max_fanout,
        ..Default::default()
    });
    let mut status = LoadStatus::default();

    for path in &input_files {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        if path == "-" {
            let stdin = io::stdin();
            let reader = stdin.lock();
            load_reader(reader, &mut engine, &mut status, &running, cli.fail_fast)?;
        } else {
            let f = File::open(path).with_context(|| format!("cannot open {path}"))?;
            let reader = BufReader::with_capacity(1 << 20, f);
            load_reader(reader, &mut engine, &mut status, &running, cli.fail_fast)?;
        }
    }
    status.log("loaded");

    // trees for distinct Shapes never interact, so rendering shards cleanly
    let trees: Vec<_> = engine.process().collect();
    let rendered: Vec<Vec<ClusterOut>> = trees
        .par_iter()
        .map(|&(shape, root)| clusters(shape, root))
        .collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    use std::io::Write;
    for tree_clusters in &rendered {
        for cluster in tree_clusters {
            if let Some(min) = cli.min_count {
                if cluster.count < min {
                    continue;
                }
            }
            if let Some(re) = &match_re {
                if !re.is_match(&cluster.pattern) {
                    continue;
                }
            }
            if let Some(re) = &exclude_re {
                if re.is_match(&cluster.pattern) {
                    continue;
                }
            }
            for line in format.render(cluster) {
                writeln!(out, "{line}")?;
            }
        }
    }
    Ok(())
}
