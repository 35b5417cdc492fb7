//! # kakaopack CLI
//!
//! Command-line interface for the kakaopack library.

use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use chrono::TimeDelta;
use clap::Parser as ClapParser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use kakaopack::cli::{Args, Command, FilterArgs, OutputArgs, ParseArgs};
use kakaopack::core::apply_filters;
use kakaopack::format::{to_format_string, write_to_format};
use kakaopack::parser::KakaoParser;
use kakaopack::stats::{ChatStats, WEEKDAY_NAMES};
use kakaopack::store::Store;
use kakaopack::{ChatTable, KakaopackError};

fn main() {
    let args = <Args as ClapParser>::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}

/// Logs go to stderr so table output on stdout stays clean.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<(), KakaopackError> {
    match args.command {
        Command::Parse {
            input,
            parser,
            filter,
            output,
        } => cmd_parse(&input, &parser, &filter, &output),
        Command::Stats {
            input,
            room,
            gap,
            json,
            parser,
            filter,
        } => {
            let table = match (input, room) {
                (_, Some(room)) => Store::open(&args.db)?.room_messages(room)?,
                (Some(input), None) => parse_input(&input, &parser)?,
                (None, None) => {
                    return Err(KakaopackError::unsupported_format(
                        "stats",
                        "an input file or --room is required",
                    ));
                }
            };
            cmd_stats(table, &filter, gap, json)
        }
        Command::Import { files, parser } => cmd_import(&args.db, &files, &parser),
        Command::Rooms => cmd_rooms(&args.db),
        Command::Files { room } => cmd_files(&args.db, room),
        Command::Export {
            room,
            filter,
            output,
        } => {
            let table = Store::open(&args.db)?.room_messages(room)?;
            let table = apply_filters(table, &filter.to_config()?);
            emit(&table, &output)
        }
        Command::DeleteRoom { room } => {
            let deleted = Store::open(&args.db)?.delete_room(room)?;
            println!(
                "🗑️  Deleted room {}: {} files, {} messages",
                room, deleted.files, deleted.messages
            );
            Ok(())
        }
        Command::DeleteFile { file } => {
            let deleted = Store::open(&args.db)?.delete_file(file)?;
            println!(
                "🗑️  Deleted file {}: {} messages ({} kept by other files)",
                file, deleted.messages, deleted.reassigned
            );
            Ok(())
        }
        Command::Info => cmd_info(&args.db),
    }
}

fn parse_input(input: &Path, parser: &ParseArgs) -> Result<ChatTable, KakaopackError> {
    KakaoParser::with_config(parser.to_config()?).parse_file(input)
}

fn cmd_parse(
    input: &Path,
    parser: &ParseArgs,
    filter: &FilterArgs,
    output: &OutputArgs,
) -> Result<(), KakaopackError> {
    let filter = filter.to_config()?;
    let start = Instant::now();
    let table = parse_input(input, parser)?;
    let parsed = table.len();
    let report = table.report().clone();
    let table = apply_filters(table, &filter);

    // Progress only when stdout is not the data channel.
    if output.path().is_some() {
        println!("📦 kakaopack v{}", env!("CARGO_PKG_VERSION"));
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("📂 Input:    {}", input.display());
        println!("🔤 Encoding: {}{}", report.encoding, if report.lossy { " (lossy)" } else { "" });
        println!("🧭 Source:   {}", report.source);
        println!(
            "   Found {} messages ({:.2}s)",
            parsed,
            start.elapsed().as_secs_f64()
        );
        if report.sentinel_count > 0 {
            println!("   ⚠️  {} messages with unreadable times", report.sentinel_count);
        }
        if report.defaulted_date_count > 0 {
            println!(
                "   ⚠️  {} messages dated by fallback",
                report.defaulted_date_count
            );
        }
        if report.rows_dropped > 0 {
            println!("   {} lines dropped", report.rows_dropped);
        }
        if filter.is_active() {
            println!("🔍 {} messages after filtering", table.len());
        }
    }

    emit(&table, output)
}

/// Writes the table to the output file, or to stdout.
fn emit(table: &ChatTable, output: &OutputArgs) -> Result<(), KakaopackError> {
    let format = output.resolve_format();
    let config = output.to_config();

    match output.path() {
        Some(path) => {
            write_to_format(table, path, format, &config)?;
            println!(
                "✅ Wrote {} messages to {} ({})",
                table.len(),
                path.display(),
                format
            );
        }
        None => print!("{}", to_format_string(table, format, &config)?),
    }
    Ok(())
}

fn cmd_stats(
    table: ChatTable,
    filter: &FilterArgs,
    gap: i64,
    json: bool,
) -> Result<(), KakaopackError> {
    let table = apply_filters(table, &filter.to_config()?);
    let gap_delta = TimeDelta::try_minutes(gap).ok_or_else(|| {
        KakaopackError::unsupported_format("--gap", format!("{gap} minutes is out of range"))
    })?;
    let stats = ChatStats::compute_with_gap(&table, gap_delta);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("📊 {} messages", stats.total_messages);
    if let Some((first, last)) = stats.date_range {
        println!("📅 {} → {}", first, last);
    }

    println!();
    println!("👥 Authors:");
    for user in &stats.users {
        println!(
            "   {:<16} {:>6} msgs  avg {:>5.1} chars  peak {:02}:00",
            user.author, user.message_count, user.avg_length, user.peak_hour
        );
    }

    println!();
    println!("🕐 Activity:");
    if let Some(hour) = stats.time.busiest_hour() {
        println!("   Busiest hour:    {:02}:00 ({} msgs)", hour, stats.time.hourly[hour as usize]);
    }
    if let Some(day) = stats.time.busiest_weekday() {
        let idx = WEEKDAY_NAMES.iter().position(|d| *d == day).unwrap_or(0);
        println!("   Busiest weekday: {} ({} msgs)", day, stats.time.weekday[idx]);
    }
    for (month, count) in &stats.time.monthly {
        println!("   {}: {}", month, count);
    }

    println!();
    println!("💬 {} conversation threads (gap {} min)", stats.threads.len(), gap);
    for thread in stats.threads.iter().rev().take(5).rev() {
        println!(
            "   #{:<4} {}  {:>4} msgs  {:>6.1} min  {}",
            thread.id,
            thread.start,
            thread.message_count,
            thread.duration_minutes(),
            thread.participants.join(", ")
        );
    }

    println!();
    println!(
        "↩️  {} replies within an hour, avg {:.0} s",
        stats.responses.total_responses, stats.responses.avg_response_seconds
    );
    for pair in stats.responses.pairs.iter().take(5) {
        println!(
            "   {} → {}  {:>4} replies  avg {:>6.0} s",
            pair.from, pair.to, pair.count, pair.avg_seconds
        );
    }

    if !stats.keywords.is_empty() {
        println!();
        let top: Vec<String> = stats
            .keywords
            .iter()
            .take(10)
            .map(|k| format!("{} ({})", k.word, k.count))
            .collect();
        println!("🔑 Keywords: {}", top.join(", "));
    }
    if !stats.mentions.is_empty() {
        let names: Vec<&str> = stats.mentions.keys().map(String::as_str).collect();
        println!("📣 Mentions: {}", names.join(", "));
    }
    if !stats.hashtags.is_empty() {
        let tags: Vec<String> = stats.hashtags.keys().map(|t| format!("#{t}")).collect();
        println!("🏷️  Hashtags: {}", tags.join(", "));
    }
    Ok(())
}

fn cmd_import(db: &Path, files: &[PathBuf], parser: &ParseArgs) -> Result<(), KakaopackError> {
    let parser = KakaoParser::with_config(parser.to_config()?);
    let mut store = Store::open(db)?;
    let start = Instant::now();
    let (mut imported, mut new_messages) = (0, 0);

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = std::fs::read(path)?;
        let outcome = store.import_bytes(&parser, &name, &bytes)?;

        if outcome.already_imported {
            println!("⏭️  {} already imported (room {}, file {})", name, outcome.room_id, outcome.file_id);
            continue;
        }
        imported += 1;
        new_messages += outcome.new_messages;
        println!(
            "📥 {} → room {}{}: {} new, {} duplicate",
            name,
            outcome.room_id,
            if outcome.room_created { " (new)" } else { "" },
            outcome.new_messages,
            outcome.duplicate_messages
        );
    }

    println!();
    println!(
        "✅ Imported {} of {} files, {} new messages ({:.2}s)",
        imported,
        files.len(),
        new_messages,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn cmd_rooms(db: &Path) -> Result<(), KakaopackError> {
    let rooms = Store::open(db)?.rooms()?;
    if rooms.is_empty() {
        println!("No rooms yet. Use `kakaopack import` first.");
        return Ok(());
    }
    for summary in rooms {
        let last = summary
            .last_message
            .map(|ts| ts.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>4}  {}  ({} messages, {} files, last {})",
            summary.room.id, summary.room.name, summary.message_count, summary.file_count, last
        );
    }
    Ok(())
}

fn cmd_files(db: &Path, room: i64) -> Result<(), KakaopackError> {
    for file in Store::open(db)?.files(room)? {
        let range = match (file.start_date, file.end_date) {
            (Some(start), Some(end)) => format!("{} → {}", start, end),
            _ => "-".to_string(),
        };
        println!(
            "{:>4}  {}  {} messages  {}  (imported {})",
            file.id, file.name, file.message_count, range, file.uploaded_at
        );
    }
    Ok(())
}

fn cmd_info(db: &Path) -> Result<(), KakaopackError> {
    let info = Store::open(db)?.info()?;
    println!("💾 Database: {}", info.path.as_deref().unwrap_or(":memory:"));
    println!("   Schema:   v{}", info.schema_version);
    println!("   Rooms:    {}", info.rooms);
    println!("   Files:    {}", info.files);
    println!("   Messages: {}", info.messages);
    println!("   Size:     {:.1} KB", info.size_bytes as f64 / 1024.0);
    Ok(())
}
