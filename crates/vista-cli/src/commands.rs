use std::io::{self, Write};
use std::ops::ControlFlow;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;
use vista_git::GitBackend;
use vista_status::{Repository, StatusConfig, StatusEntry, StatusOptions, UntrackedMode};
use vista_types::{PathKey, Scope, StatusFlags};

use crate::cli::*;

type GitRepository = Repository<GitBackend>;

pub fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let repo = open_repository(&cli.repo, cli.config.as_deref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Command::Status(args) => cmd_status(&repo, &args, &mut out)?,
        Command::File(args) => cmd_file(&repo, &args, &mut out)?,
        Command::CheckIgnore(args) => {
            if !cmd_check_ignore(&repo, &args, &mut out)? {
                return Ok(ExitCode::from(1));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn open_repository(path: &Path, config: Option<&Path>) -> anyhow::Result<GitRepository> {
    let mut backend = GitBackend::discover(path)
        .with_context(|| format!("not inside a git repository: {}", path.display()))?;
    if let Some(config) = config {
        backend = backend.with_config(StatusConfig::load(config)?);
    }
    Ok(Repository::new(backend))
}

fn status_options(repo: &GitRepository, args: &StatusArgs) -> anyhow::Result<StatusOptions> {
    let mut options = repo.default_options();
    if let Some(mode) = args.untracked.map(UntrackedMode::from) {
        options.include_untracked = mode != UntrackedMode::No;
        options.recurse_untracked_dirs = mode == UntrackedMode::All;
    }
    // Ignored entries are opt-in on the command line.
    options.include_ignored = args.ignored;
    if let Some(prefix) = &args.prefix {
        let key = PathKey::parse(prefix)?;
        let on_disk = key.to_path(repo.backend().workdir());
        options.scope = if key.is_dir() || on_disk.is_dir() {
            Scope::directory(&key)
        } else {
            Scope::path(&key)
        };
    }
    Ok(options)
}

fn cmd_status(repo: &GitRepository, args: &StatusArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let options = status_options(repo, args)?;
    let limit = args.limit.unwrap_or(usize::MAX);

    let mut entries = Vec::new();
    let flow = repo
        .for_each(&options, |path: &PathKey, flags: StatusFlags| {
            if entries.len() >= limit {
                return ControlFlow::Break(());
            }
            entries.push(StatusEntry {
                path: path.clone(),
                flags,
            });
            if entries.len() >= limit {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .context("cannot compute status")?;

    if args.json {
        render_json(&entries, out)?;
    } else if args.porcelain {
        render_porcelain(&entries, out)?;
    } else {
        render_long(&entries, out)?;
    }
    if flow.is_break() {
        eprintln!("{} stopped after {} entries", "note:".yellow(), entries.len());
    }
    Ok(())
}

fn cmd_file(repo: &GitRepository, args: &FileArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let flags = repo.status_of(&args.path)?;
    writeln!(out, "{}\t{}", args.path, flags)?;
    Ok(())
}

/// Prints the ignored paths; returns whether any was ignored.
fn cmd_check_ignore(
    repo: &GitRepository,
    args: &CheckIgnoreArgs,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let mut any = false;
    for path in &args.paths {
        if !repo.should_ignore(path)? {
            continue;
        }
        any = true;
        match repo.ignore_rule_for(path)? {
            Some(rule) if args.show_rule => writeln!(out, "{rule}\t{path}")?,
            _ => writeln!(out, "{path}")?,
        }
    }
    Ok(any)
}

/// Two-column status code: index then worktree.
fn porcelain_code(flags: StatusFlags) -> String {
    if flags.contains(StatusFlags::IGNORED) {
        return "!!".to_string();
    }
    if flags.contains(StatusFlags::WT_NEW) && !flags.is_index_change() {
        return "??".to_string();
    }
    let index = if flags.contains(StatusFlags::INDEX_NEW) {
        'A'
    } else if flags.contains(StatusFlags::INDEX_MODIFIED) {
        'M'
    } else if flags.contains(StatusFlags::INDEX_DELETED) {
        'D'
    } else {
        ' '
    };
    let worktree = if flags.contains(StatusFlags::WT_MODIFIED) {
        'M'
    } else if flags.contains(StatusFlags::WT_DELETED) {
        'D'
    } else if flags.contains(StatusFlags::WT_NEW) {
        '?'
    } else {
        ' '
    };
    [index, worktree].iter().collect()
}

fn render_porcelain(entries: &[StatusEntry], out: &mut impl Write) -> io::Result<()> {
    for entry in entries {
        writeln!(out, "{} {}", porcelain_code(entry.flags), entry.path)?;
    }
    Ok(())
}

fn render_json(entries: &[StatusEntry], out: &mut impl Write) -> anyhow::Result<()> {
    for entry in entries {
        let line = serde_json::json!({
            "path": entry.path,
            "flags": entry.flags.bits(),
            "names": entry.flags.names(),
        });
        writeln!(out, "{}", serde_json::to_string(&line)?)?;
    }
    Ok(())
}

fn render_long(entries: &[StatusEntry], out: &mut impl Write) -> io::Result<()> {
    let staged: Vec<_> = entries.iter().filter(|e| e.flags.is_index_change()).collect();
    let unstaged: Vec<_> = entries.iter().filter(|e| e.flags.is_worktree_change()).collect();
    let untracked: Vec<_> = entries
        .iter()
        .filter(|e| e.flags.contains(StatusFlags::WT_NEW))
        .collect();
    let ignored: Vec<_> = entries
        .iter()
        .filter(|e| e.flags.contains(StatusFlags::IGNORED))
        .collect();

    if staged.is_empty() && unstaged.is_empty() && untracked.is_empty() {
        writeln!(out, "{}", "nothing to commit, working tree clean".green())?;
    }

    if !staged.is_empty() {
        writeln!(out, "{}", "Changes to be committed:".bold())?;
        for entry in staged {
            let label = if entry.flags.contains(StatusFlags::INDEX_NEW) {
                "new file:"
            } else if entry.flags.contains(StatusFlags::INDEX_DELETED) {
                "deleted:"
            } else {
                "modified:"
            };
            writeln!(out, "  {:<10} {}", label.green(), entry.path.to_string().green())?;
        }
        writeln!(out)?;
    }

    if !unstaged.is_empty() {
        writeln!(out, "{}", "Changes not staged for commit:".bold())?;
        for entry in unstaged {
            let label = if entry.flags.contains(StatusFlags::WT_DELETED) {
                "deleted:"
            } else {
                "modified:"
            };
            writeln!(out, "  {:<10} {}", label.red(), entry.path.to_string().red())?;
        }
        writeln!(out)?;
    }

    for (title, group) in [("Untracked files:", untracked), ("Ignored files:", ignored)] {
        if group.is_empty() {
            continue;
        }
        writeln!(out, "{}", title.bold())?;
        for entry in group {
            writeln!(out, "  {}", entry.path.to_string().red())?;
        }
        writeln!(out)?;
    }
    Ok(())
}
