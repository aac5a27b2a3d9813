use clap::{Parser, Subcommand};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use easel::Runtime;

#[derive(Parser)]
#[command(name = "easel", about = "Easel: a scriptable canvas viewer", version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Script to execute (.esl source or .eslm compiled module)
    file: Option<String>,

    /// Evaluate an expression and print its exit value
    #[arg(short, long)]
    eval: Option<String>,

    /// Load a JSON scene onto the canvas before running
    #[arg(short, long)]
    scene: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse source and display the AST
    Ast {
        /// File to parse
        file: Option<String>,

        /// Expression to parse
        #[arg(short, long)]
        eval: Option<String>,
    },
    /// Compile source and display the bytecode
    Disasm {
        /// File to compile (.esl) or load (.eslm)
        file: String,
    },
    /// Compile a source file to a .eslm module
    Compile {
        /// Source file
        file: String,

        /// Output path (defaults to the input with .eslm)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn read_file(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(src) => src,
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn module_name(path: &str) -> String {
    std::path::Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "main".to_string())
}

fn load_module(path: &str) -> easel_vm::ExecutionModule {
    let result = if path.ends_with(".eslm") {
        match std::fs::read(path) {
            Ok(bytes) => easel::read_module_bytes(&bytes),
            Err(e) => {
                eprintln!("Error reading {path}: {e}");
                std::process::exit(1);
            }
        }
    } else {
        easel::compile_source(&module_name(path), &read_file(path))
    };
    match result {
        Ok(module) => module,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Some(command) = cli.command {
        match command {
            Commands::Ast { file, eval } => run_ast(file, eval),
            Commands::Disasm { file } => {
                let module = load_module(&file);
                print!("{}", easel::disassemble(&module));
            }
            Commands::Compile { file, output } => {
                let module = easel::compile_source(&module_name(&file), &read_file(&file));
                let module = match module {
                    Ok(m) => m,
                    Err(e) => {
                        eprintln!("{e}");
                        std::process::exit(1);
                    }
                };
                let out = output.unwrap_or_else(|| {
                    std::path::Path::new(&file)
                        .with_extension("eslm")
                        .to_string_lossy()
                        .into_owned()
                });
                if let Err(e) = std::fs::write(&out, easel::write_module(&module)) {
                    eprintln!("Error writing {out}: {e}");
                    std::process::exit(1);
                }
                eprintln!("wrote {out}");
            }
        }
        return;
    }

    let runtime = Runtime::new();

    if let Some(scene_path) = &cli.scene {
        let json = read_file(scene_path);
        let viewport = runtime.viewport();
        let mut viewport = viewport.borrow_mut();
        match easel_canvas::load_scene(&json, &mut viewport.layer) {
            Ok(n) => eprintln!("loaded {n} objects from {scene_path}"),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
    }

    if let Some(expr) = &cli.eval {
        match runtime.eval_source("eval", expr) {
            Ok(status) => {
                println!("{status}");
                std::process::exit((status & 0xff) as i32);
            }
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
    }

    if let Some(file) = &cli.file {
        let status = if file.ends_with(".eslm") {
            runtime.eval_module(load_module(file))
        } else {
            runtime.eval_source(&module_name(file), &read_file(file))
        };
        match status {
            Ok(status) => std::process::exit((status & 0xff) as i32),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
    }

    repl();
}

fn run_ast(file: Option<String>, eval: Option<String>) {
    let (name, source) = match (&file, &eval) {
        (Some(path), None) => (module_name(path), read_file(path)),
        (None, Some(expr)) => ("eval".to_string(), expr.clone()),
        _ => {
            eprintln!("Error: provide a file or --eval expression");
            std::process::exit(1);
        }
    };
    match easel::read_module(&name, &source) {
        Ok(module) => {
            for expr in &module.exprs {
                println!("{expr}");
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Accumulating REPL: each accepted line re-runs the whole buffer on a
/// fresh VM and canvas, so bindings from earlier lines stay visible.
fn repl() {
    let mut editor = match DefaultEditor::new() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("cannot start REPL: {e}");
            std::process::exit(1);
        }
    };
    eprintln!("Easel REPL. Ctrl-D to exit.");
    let mut history: Vec<String> = Vec::new();

    loop {
        match editor.readline("easel> ") {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(&line);
                let mut program = history.join("\n");
                if !program.is_empty() {
                    program.push('\n');
                }
                program.push_str(&line);

                let runtime = Runtime::new();
                match runtime.eval_source("repl", &program) {
                    Ok(status) => {
                        println!("= {status}");
                        history.push(line);
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("read error: {e}");
                break;
            }
        }
    }
}
