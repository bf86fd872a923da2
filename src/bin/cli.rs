use qfilter::{
    tokenize, Expected, LexError, ParseError, PredicateNode, QueryParser, SyntaxError, Token,
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_HEIGHT,
};

use clap::{Args, Parser, Subcommand};
use colored::*;
use human_panic::setup_panic;

#[derive(Parser, Debug)]
#[command(name = "qfilter", about, version)]
struct Arguments {
    #[command(subcommand)]
    command: Command,

    /// Comma separated list of fields a query may reference
    #[arg(long, global = true, env = "QFILTER_ALLOWED_FIELDS", value_delimiter = ',')]
    allow: Option<Vec<String>>,

    /// Maximum nesting of parenthesised groups
    #[arg(long, global = true, env = "QFILTER_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Maximum height of the predicate tree
    #[arg(long, global = true, env = "QFILTER_MAX_HEIGHT", default_value_t = DEFAULT_MAX_HEIGHT)]
    max_height: usize,

    /// Print intermediate data structures
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Checks syntax and field names of a query
    Check(Query),
    /// Prints the predicate tree of a query
    Parse(Output),
    /// Prints the tokens of a query
    Tokens(Output),
}

#[derive(Args, Debug)]
struct Query {
    /// Query text, multiple words are joined with spaces
    #[arg(required = true)]
    query: Vec<String>,
}

#[derive(Args, Debug)]
struct Output {
    #[command(flatten)]
    query: Query,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    setup_panic!();

    let args = Arguments::parse();
    init_logger(args.debug);

    let mut parser = QueryParser::new()
        .with_max_depth(args.max_depth)
        .with_max_height(args.max_height);
    if let Some(allow) = &args.allow {
        let fields: Vec<&str> = allow.iter().map(|f| f.trim()).filter(|f| !f.is_empty()).collect();
        parser = parser.with_allowed_fields(fields);
    }

    let mut eprint = ErrorPrinter::new();

    match args.command {
        Command::Check(check) => {
            let src = check.query.join(" ");
            if parse_query(&mut eprint, &parser, &src, args.debug).is_err() {
                std::process::exit(1);
            }

            println!("{}", "Query is valid".bold().green());
        },
        Command::Parse(output) => {
            let src = output.query.query.join(" ");
            let tree = match parse_query(&mut eprint, &parser, &src, args.debug) {
                Ok(tree) => tree,
                Err(()) => std::process::exit(1),
            };

            if output.json {
                print_json(&mut eprint, &tree);
            } else {
                println!("{}\n", tree.to_string().bold());
                println!("{:#?}", tree);
            }
        },
        Command::Tokens(output) => {
            let src = output.query.query.join(" ");
            eprint.set_src(&src);

            let tokens = match tokenize(&src) {
                Ok(tokens) => tokens,
                Err(error) => {
                    eprint.lexical_error(&error);
                    std::process::exit(1);
                },
            };

            if output.json {
                print_json(&mut eprint, &tokens);
            } else {
                tokens.iter().for_each(print_token);
            }
        },
    }
}

fn init_logger(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn parse_query(
    eprint: &mut ErrorPrinter,
    parser: &QueryParser,
    src: &str,
    debug: bool,
) -> Result<PredicateNode, ()> {
    eprint.set_src(src);

    if debug {
        if let Ok(tokens) = tokenize(src) {
            println!("{}", "Tokens:".bold());
            tokens.iter().for_each(|t| println!("{:?}", t));
            println!();
        }
    }

    parser.parse(src).map_err(|error| eprint.parse_error(&error))
}

fn print_json<T: serde::Serialize>(eprint: &mut ErrorPrinter, value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(err) => {
            eprint.error(&err.to_string());
            std::process::exit(1);
        },
    }
}

fn print_token(token: &Token) {
    println!(
        "{:>4}  {:<24} {}",
        token.get_pos().to_string().dimmed(),
        format!("{:?}", token.get_kind()),
        token.get_text().bold(),
    );
}

struct ErrorPrinter {
    first_error: bool,
    src: Option<String>,
}

impl ErrorPrinter {
    fn new() -> ErrorPrinter {
        ErrorPrinter {
            first_error: true,
            src: None,
        }
    }

    fn set_src(&mut self, src: &str) {
        self.src = Some(src.to_string());
    }

    fn check_line(&mut self) {
        if self.first_error {
            self.first_error = false;
        } else {
            eprintln!();
        }
    }

    fn error(&mut self, msg: &str) {
        self.first_error = false;

        eprintln!(
            "{}{}",
            "error: ".bold().red(),
            msg.bold(),
        );
    }

    // `position` is a byte offset into the query.
    fn error_pos(&mut self, msg: &str, position: usize) {
        self.check_line();

        if let Some(src) = &self.src {
            let before = src.get(..position).unwrap_or(src);
            let line = before.matches('\n').count() + 1;
            let line_start = before.rfind('\n').map_or(0, |i| i + 1);
            let column = before[line_start..].chars().count() + 1;

            let src_line = src.lines().nth(line - 1).unwrap_or("");
            let line_str = line.to_string();
            let line_prefix = format!(
                "{}{}{}",
                "line ".bold().dimmed(),
                line_str.bold().dimmed(),
                ":  ".bold().dimmed(),
            );

            eprintln!(
                "{}{}",
                &line_prefix,
                src_line.trim_end(),
            );

            let pos_offset = column - 1 + line_str.len() + 5 + 3;
            eprintln!("{}{}", " ".repeat(pos_offset), "^".yellow());
        }

        self.error(msg);
    }

    fn lexical_error(&mut self, error: &LexError) {
        self.error_pos(&error.reason.to_string(), error.position);
    }

    fn syntax_error(&mut self, error: &SyntaxError) {
        let expected_str = error.expected.iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(", ");

        let mut msg = format!("encountered an unexpected {} while expecting ", error.found.describe());
        if error.expected.len() > 1 {
            msg += &format!("one of: {}", expected_str);
        } else if error.expected == [Expected::Expression] {
            msg += "a comparison or `(`";
        } else {
            msg += &expected_str;
        }

        self.error_pos(&msg, error.position);
    }

    fn parse_error(&mut self, error: &ParseError) {
        match error {
            ParseError::Lex(err) => self.lexical_error(err),
            ParseError::Syntax(err) => self.syntax_error(err),
            ParseError::FieldNotAllowed { .. } => {
                self.check_line();
                self.error(&error.to_string());
            },
            ParseError::MaxDepthExceeded { position, limit } => {
                let msg = format!("groups may be nested at most {} levels deep", limit);
                self.error_pos(&msg, *position);
            },
            ParseError::MaxHeightExceeded { position, limit } => {
                let msg = format!("query combines more than {} levels of AND/OR", limit);
                self.error_pos(&msg, *position);
            },
        }
    }
}
