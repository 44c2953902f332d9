use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, EnvFilter};
use vsr::config::{PageRankConfig, DEFAULT_DAMPING, DEFAULT_ITERATIONS, MAX_RETRIEVALS};
use vsr::persist::{load_score_table, save_score_table, CorpusPaths};
use vsr::tokenizer::{strip_markup, vectorize};
use vsr::{
    Binary, Cosine, DocId, DocumentVector, Feedback, FeedbackPolicy, Graded, Index, IndexBuilder,
    LinkGraph, PageRank, QueryCoverage, Retrieval, Scorer,
};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: String,
    body: String,
}

/// One visited page of a crawl log and the links found on it.
#[derive(Debug, Deserialize)]
struct CrawlRecord {
    page: String,
    #[serde(default)]
    links: Vec<String>,
}

#[derive(Serialize)]
struct OutHit<'a> {
    pass: &'static str,
    rank: usize,
    id: &'a str,
    score: f64,
}

#[derive(Parser)]
#[command(name = "vsr-indexer")]
#[command(about = "Vector-space retrieval with relevance feedback and PageRank", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index JSON/JSONL documents and run one ranked query
    Search(SearchArgs),
    /// Compute PageRank over a crawl log and write page_ranks.txt
    Pagerank(PageRankArgs),
}

#[derive(Args)]
struct SearchArgs {
    /// Input path (file or directory)
    #[arg(long)]
    input: String,
    /// Free-text query
    #[arg(long)]
    query: String,
    /// Reduce tokens to their English stems
    #[arg(long, default_value_t = false)]
    stem: bool,
    /// Document bodies are HTML pages; index their visible text only
    #[arg(long, default_value_t = false)]
    html: bool,
    /// Number of results to print per pass
    #[arg(long, default_value_t = MAX_RETRIEVALS)]
    top: usize,
    /// Add the fraction of matched query terms to each score
    #[arg(long, default_value_t = false, conflicts_with_all = ["page_ranks", "page_weight"])]
    coverage: bool,
    /// Score table to blend in (defaults to page_ranks.txt next to the input)
    #[arg(long)]
    page_ranks: Option<PathBuf>,
    /// Weight of the PageRank term; 0 disables blending
    #[arg(long)]
    page_weight: Option<f64>,
    /// Document judged relevant (binary feedback)
    #[arg(long)]
    relevant: Vec<String>,
    /// Document judged irrelevant (binary feedback)
    #[arg(long)]
    irrelevant: Vec<String>,
    /// Graded feedback as ID=RATING with RATING in [-1, 1]
    #[arg(long, conflicts_with_all = ["relevant", "irrelevant"])]
    rate: Vec<String>,
    /// Print the inverted index to stderr before querying
    #[arg(long, default_value_t = false)]
    dump_index: bool,
}

#[derive(Args)]
struct PageRankArgs {
    /// Crawl log: JSONL with one {"page", "links"} record per visited page
    #[arg(long)]
    crawl: PathBuf,
    /// Output directory for page_ranks.txt
    #[arg(long)]
    output: PathBuf,
    /// Teleportation probability
    #[arg(long, default_value_t = DEFAULT_DAMPING)]
    damping: f64,
    /// Fixed number of power iterations
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    iterations: usize,
    /// Print the link graph to stderr
    #[arg(long, default_value_t = false)]
    dump_graph: bool,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search(args) => search(&args),
        Commands::Pagerank(args) => pagerank(&args),
    }
}

fn search(args: &SearchArgs) -> Result<()> {
    let mut builder = IndexBuilder::new();
    builder.index_documents(load_documents(Path::new(&args.input), args.stem, args.html)?)?;
    let index = builder.finalize(Cosine);
    tracing::info!(num_docs = index.num_docs(), num_terms = index.len(), "indexed documents");
    if args.dump_index {
        index.dump(io::stderr().lock())?;
    }

    if args.coverage {
        return run_query(&index.with_scorer(QueryCoverage), args);
    }
    if let Some(weight) = args.page_weight {
        let path = match &args.page_ranks {
            Some(p) => p.clone(),
            None => CorpusPaths::new(corpus_dir(Path::new(&args.input))).score_table(),
        };
        let table = load_score_table(&path).with_context(|| format!("loading {}", path.display()))?;
        let index = index.with_page_rank(&table, weight)?;
        tracing::info!(path = %path.display(), page_weight = weight, "blending PageRank");
        return run_query(&index, args);
    }
    if args.page_ranks.is_some() {
        bail!("--page-ranks needs --page-weight");
    }
    run_query(&index, args)
}

fn run_query<S: Scorer>(index: &Index<S>, args: &SearchArgs) -> Result<()> {
    let query = vectorize(&args.query, args.stem);
    let retrievals = index.retrieve(&query);
    tracing::info!(hits = retrievals.len(), "query executed");

    let mut out = io::stdout().lock();
    print_hits(&mut out, index, "initial", &retrievals, args.top)?;

    let revised = if !args.rate.is_empty() {
        let judgments = args
            .rate
            .iter()
            .map(|arg| -> Result<(DocId, f64)> {
                let (name, rating) = parse_rating(arg)?;
                Ok((lookup(index, name)?, rating))
            })
            .collect::<Result<Vec<_>>>()?;
        Some(apply_feedback(index, query, retrievals, Graded, judgments)?)
    } else if !args.relevant.is_empty() || !args.irrelevant.is_empty() {
        let judgments = args
            .relevant
            .iter()
            .map(|n| -> Result<(DocId, bool)> { Ok((lookup(index, n)?, true)) })
            .chain(args.irrelevant.iter().map(|n| -> Result<(DocId, bool)> { Ok((lookup(index, n)?, false)) }))
            .collect::<Result<Vec<_>>>()?;
        Some(apply_feedback(index, query, retrievals, Binary, judgments)?)
    } else {
        None
    };

    if let Some(retrievals) = revised {
        tracing::info!(hits = retrievals.len(), "revised query executed");
        print_hits(&mut out, index, "feedback", &retrievals, args.top)?;
    }
    Ok(())
}

fn apply_feedback<S, P>(
    index: &Index<S>,
    query: DocumentVector,
    retrievals: Vec<Retrieval>,
    policy: P,
    judgments: Vec<(DocId, P::Judgment)>,
) -> Result<Vec<Retrieval>>
where
    S: Scorer,
    P: FeedbackPolicy,
{
    let mut feedback = Feedback::new(index, query, retrievals, policy);
    for (doc, judgment) in judgments {
        feedback.judge(doc, judgment)?;
    }
    let names = |it: Vec<(DocId, f64)>| -> Vec<String> {
        it.into_iter()
            .filter_map(|(doc, _)| index.document(doc).map(|d| d.name().to_string()))
            .collect()
    };
    tracing::info!(
        positive = ?names(feedback.good().collect()),
        negative = ?names(feedback.bad().collect()),
        "executing revised query"
    );
    Ok(index.retrieve(&feedback.new_query()))
}

fn print_hits<W: Write, S>(out: &mut W, index: &Index<S>, pass: &'static str, retrievals: &[Retrieval], top: usize) -> Result<()> {
    for (i, r) in retrievals.iter().take(top).enumerate() {
        let id = index.document(r.doc).map(|d| d.name()).unwrap_or_default();
        serde_json::to_writer(&mut *out, &OutHit { pass, rank: i + 1, id, score: r.score })?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

fn lookup<S>(index: &Index<S>, name: &str) -> Result<DocId> {
    index.find(name).ok_or_else(|| anyhow!("unknown document `{name}`"))
}

fn parse_rating(arg: &str) -> Result<(&str, f64)> {
    let (name, rating) = arg
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("expected ID=RATING, got `{arg}`"))?;
    let rating: f64 = rating.trim().parse().with_context(|| format!("bad rating in `{arg}`"))?;
    Ok((name.trim(), rating))
}

/// Directory whose page_ranks.txt belongs to `input`.
fn corpus_dir(input: &Path) -> PathBuf {
    if input.is_dir() {
        input.to_path_buf()
    } else {
        input.parent().map(Path::to_path_buf).unwrap_or_default()
    }
}

fn load_documents(input_path: &Path, stem: bool, html: bool) -> Result<Vec<(String, DocumentVector)>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        bail!("input {} does not exist", input_path.display());
    }

    let mut docs = Vec::new();
    for file in files {
        let parsed = if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file)?
        } else {
            read_json(&file)?
        };
        docs.extend(parsed.into_iter().map(|d| {
            let vector = if html { vectorize(&strip_markup(&d.body), stem) } else { vectorize(&d.body, stem) };
            (d.id, vector)
        }));
    }
    Ok(docs)
}

fn read_jsonl(file: &Path) -> Result<Vec<InputDoc>> {
    let reader = BufReader::new(File::open(file)?);
    let mut docs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        docs.push(serde_json::from_str(&line).with_context(|| format!("parsing {}", file.display()))?);
    }
    Ok(docs)
}

fn read_json(file: &Path) -> Result<Vec<InputDoc>> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    let docs = match json {
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .map(serde_json::from_value)
            .collect::<serde_json::Result<Vec<InputDoc>>>()?,
        serde_json::Value::Object(_) => vec![serde_json::from_value(json)?],
        _ => Vec::new(),
    };
    Ok(docs)
}

fn pagerank(args: &PageRankArgs) -> Result<()> {
    if !(0.0..=1.0).contains(&args.damping) {
        bail!("--damping must be in [0, 1], got {}", args.damping);
    }
    let records = read_crawl(&args.crawl)?;
    let visited: Vec<&str> = records.iter().map(|r| r.page.as_str()).collect();
    let links = records
        .iter()
        .flat_map(|r| r.links.iter().map(move |l| (r.page.as_str(), l.as_str())));
    let graph = LinkGraph::from_crawl(visited, links);
    tracing::info!(
        nodes = graph.len(),
        edges = graph.edge_count(),
        sources = graph.sources().len(),
        "link graph built"
    );
    if args.dump_graph {
        graph.dump(io::stderr().lock())?;
    }

    let config = PageRankConfig { damping: args.damping, iterations: args.iterations };
    let table = PageRank::new(config).compute(&graph);
    let output = CorpusPaths::new(&args.output).score_table();
    save_score_table(&output, &table)?;
    tracing::info!(output = %output.display(), pages = table.len(), "pagerank written");
    Ok(())
}

fn read_crawl(file: &Path) -> Result<Vec<CrawlRecord>> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_ratings() {
        assert_eq!(parse_rating("P01.html=0.5").unwrap(), ("P01.html", 0.5));
        assert_eq!(parse_rating("a=b=-1").unwrap(), ("a=b", -1.0));
        assert!(parse_rating("nope").is_err());
        assert!(parse_rating("x=high").is_err());
    }

    #[test]
    fn loads_json_and_jsonl_from_directory() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a.json"),
            r#"[{"id": "D1", "body": "cat dog"}, {"id": "D2", "title": "t", "body": "dog bird"}]"#,
        )
        .unwrap();
        fs::write(dir.path().join("b.jsonl"), "{\"id\": \"D3\", \"body\": \"cat cat bird\"}\n\n").unwrap();
        fs::write(dir.path().join("ignored.txt"), "not a document").unwrap();

        let docs = load_documents(dir.path(), false, false).unwrap();
        let ids: Vec<&str> = docs.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["D1", "D2", "D3"]);
        assert_eq!(docs[2].1.get("cat"), 2.0);
    }

    #[test]
    fn html_bodies_lose_their_markup() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("p.jsonl"), "{\"id\": \"P1.html\", \"body\": \"<p>cat</p>\"}\n").unwrap();
        let docs = load_documents(dir.path(), false, true).unwrap();
        assert_eq!(docs[0].1.get("cat"), 1.0);
        assert!(!docs[0].1.contains("p"));
    }

    #[test]
    fn pagerank_command_writes_table() {
        let dir = tempdir().unwrap();
        let crawl = dir.path().join("crawl.jsonl");
        fs::write(
            &crawl,
            concat!(
                "{\"page\": \"P1.html\", \"links\": [\"P2.html\", \"http://elsewhere\"]}\n",
                "{\"page\": \"P2.html\", \"links\": [\"P1.html\", \"P3.html\"]}\n",
                "{\"page\": \"P3.html\"}\n",
            ),
        )
        .unwrap();
        let args = PageRankArgs {
            crawl,
            output: dir.path().join("out"),
            damping: DEFAULT_DAMPING,
            iterations: DEFAULT_ITERATIONS,
            dump_graph: false,
        };
        pagerank(&args).unwrap();

        let table = load_score_table(&dir.path().join("out").join("page_ranks.txt")).unwrap();
        assert_eq!(table.len(), 3);
        assert!((table.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn pagerank_command_rejects_bad_damping() {
        let dir = tempdir().unwrap();
        let crawl = dir.path().join("crawl.jsonl");
        fs::write(&crawl, "{\"page\": \"P1.html\"}\n").unwrap();
        for damping in [-0.1, 1.5, f64::NAN] {
            let args = PageRankArgs {
                crawl: crawl.clone(),
                output: dir.path().join("out"),
                damping,
                iterations: DEFAULT_ITERATIONS,
                dump_graph: false,
            };
            assert!(pagerank(&args).is_err(), "damping {damping}");
        }
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn hits_are_json_lines_tagged_with_their_pass() {
        let mut builder = IndexBuilder::new();
        builder
            .index_documents([
                ("D1", vectorize("cat dog", false)),
                ("D2", vectorize("dog bird", false)),
                ("D3", vectorize("cat cat bird", false)),
            ])
            .unwrap();
        let index = builder.finalize(Cosine);
        let retrievals = index.retrieve(&vectorize("cat", false));

        let mut out = Vec::new();
        print_hits(&mut out, &index, "feedback", &retrievals, 1).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        let row: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(row["pass"], "feedback");
        assert_eq!(row["rank"], 1);
        assert_eq!(row["id"], "D3");
        assert!(row["score"].as_f64().unwrap() > 0.0);
    }
}
