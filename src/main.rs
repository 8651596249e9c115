use betty::cli::{generate_completions, Args, Commands};
use betty::config::{init_tracing, AppConfig};
use betty::diagnostic::{render_diagnostics, Diagnostic};
use betty::{parse, Interpreter};
use clap::Parser;
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;

const EDITOR_FILE_NAME: &str = "<editor>";

fn main() {
    let args = Args::parse();

    if let Some(Commands::Complete { shell }) = args.command {
        generate_completions(shell);
        return;
    }

    let config = AppConfig::from_args(&args);
    init_tracing(config.verbose);

    match &args.script {
        Some(path) => {
            let source = match read_file(path) {
                Ok(s) => s,
                Err(e) => {
                    error_message(&config, &e);
                    std::process::exit(1);
                }
            };
            debug!(path = %path.display(), bytes = source.len(), "read script");

            if !run_source(&source, &path.display().to_string(), &config) {
                std::process::exit(1);
            }
        }
        None => run_program_editor(&config),
    }
}

/// Parse and run one program. Returns false if any error was reported.
fn run_source(source: &str, file_name: &str, config: &AppConfig) -> bool {
    let (program, errors) = parse(source);
    if !errors.is_empty() {
        let diagnostics: Vec<Diagnostic> = errors.iter().map(|e| e.to_diagnostic()).collect();
        eprint!(
            "{}",
            render_diagnostics(source, file_name, &diagnostics, config.color_enabled)
        );
        return false;
    }

    if config.check {
        debug!(file = file_name, "syntax check passed");
        return true;
    }

    match Interpreter::new().run(&program) {
        Ok(value) => {
            if config.print_result && !value.is_none() {
                println!("{}", value);
            }
            true
        }
        Err(e) => {
            io::stdout().flush().ok();
            eprint!(
                "{}",
                render_diagnostics(source, file_name, &[e.to_diagnostic()], config.color_enabled)
            );
            false
        }
    }
}

fn run_program_editor(config: &AppConfig) {
    println!("Betty");
    println!("Type \":help\" for more information.");

    let mut lines: Vec<String> = Vec::new();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                error_message(config, &format!("Error reading input: {}", e));
                break;
            }
        }

        let line = line.trim_end_matches(['\n', '\r']);
        let command = line.trim().to_lowercase();
        match command.as_str() {
            "" => continue,
            ":help" => show_help(),
            ":list" => list_program(&lines),
            ":run" => run_program(&lines, config),
            ":clear" => {
                lines.clear();
                println!("Program cleared.");
            }
            ":exit" => break,
            _ => lines.push(line.to_string()),
        }
    }

    println!("Exiting Betty Program Editor.");
}

fn show_help() {
    println!("Program Editor Commands:");
    println!("  :help  - Show this help");
    println!("  :list  - List current program");
    println!("  :run   - Execute the current program");
    println!("  :clear - Clear the current program");
    println!("  :exit  - Exit the program editor");
    println!("Enter your program line by line. Use commands to manage the program.");
}

fn list_program(lines: &[String]) {
    if lines.is_empty() {
        println!("Program is empty.");
        return;
    }

    println!("Current Program:");
    for (i, line) in lines.iter().enumerate() {
        println!("{}: {}", i + 1, line);
    }
}

fn run_program(lines: &[String], config: &AppConfig) {
    if lines.is_empty() {
        println!("No program to run.");
        return;
    }

    let source = lines.join("\n");
    println!("--- Program Output ---");
    if run_source(&source, EDITOR_FILE_NAME, config) {
        println!("--- Program Finished ---");
    }
}

fn read_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))
}

fn error_message(config: &AppConfig, message: &str) {
    if config.color_enabled {
        eprintln!("{}", message.red().bold());
    } else {
        eprintln!("{}", message);
    }
}
