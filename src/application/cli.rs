use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

pub const IMAGE_SIZES: [&str; 3] = ["1024x1024", "1792x1024", "1024x1792"];
pub const IMAGE_QUALITIES: [&str; 2] = ["standard", "hd"];

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

pub fn env_name(key: ConfigKey) -> String {
    return format!(
        "CLASSROOM_AI_{}",
        key.to_string().to_uppercase().replace('-', "_")
    );
}

/// A global flag backed by a config key. Secrets never print their value in
/// help output.
fn arg_config(key: ConfigKey, help: &str) -> Arg {
    let default = Config::default(key);
    let help = if key.is_secret() || default.is_empty() {
        help.to_string()
    } else {
        format!("{help} [default: {default}]")
    };

    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env_name(key))
        .hide_env_values(key.is_secret())
        .num_args(1)
        .help(help)
        .global(true);
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for Classroom AI")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running with environment variable RUST_LOG=classroom_ai")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn subcommand_serve() -> Command {
    return Command::new("serve").about("Start the classroom web server. This is the default command.");
}

pub fn log_dir() -> path::PathBuf {
    if let Ok(dir) = std::env::var("CLASSROOM_AI_LOG_DIR") {
        return path::PathBuf::from(dir);
    }

    return dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("classroom-ai");
}

pub fn build() -> Command {
    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("classroom-ai")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(false)
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .subcommand(subcommand_serve())
        .arg(
            arg_config(ConfigKey::ConfigFile, "Path to configuration file")
                .short('c'),
        )
        .arg(arg_config(ConfigKey::Host, "Address the web server binds to.").short('H'))
        .arg(arg_config(ConfigKey::Port, "Port the web server listens on.").short('p'))
        .arg(arg_config(
            ConfigKey::NotionToken,
            "Notion integration token used to look up activity prompts.",
        ))
        .arg(arg_config(
            ConfigKey::NotionDatabaseID,
            "ID of the Notion database holding activity prompts.",
        ))
        .arg(arg_config(ConfigKey::NotionURL, "Notion API URL."))
        .arg(arg_config(ConfigKey::NotionVersion, "Notion API version header."))
        .arg(arg_config(
            ConfigKey::GeminiToken,
            "Google Gemini API key used by the image analysis tool.",
        ))
        .arg(arg_config(
            ConfigKey::GeminiURL,
            "Gemini API URL. Can be swapped to a compatible proxy.",
        ))
        .arg(arg_config(
            ConfigKey::VisionModel,
            "Gemini model used to analyse uploaded images.",
        ))
        .arg(arg_config(
            ConfigKey::OpenAiToken,
            "OpenAI API token used by the dialogue and image generation tools.",
        ))
        .arg(arg_config(
            ConfigKey::OpenAiURL,
            "OpenAI API URL. Can be swapped to a compatible proxy.",
        ))
        .arg(arg_config(ConfigKey::ChatModel, "OpenAI model used to generate dialogue."))
        .arg(arg_config(ConfigKey::ImageModel, "OpenAI model used to generate images."))
        .arg(
            arg_config(ConfigKey::ImageSize, "Size of generated images.")
                .value_parser(PossibleValuesParser::new(IMAGE_SIZES)),
        )
        .arg(
            arg_config(ConfigKey::ImageQuality, "Quality of generated images.")
                .value_parser(PossibleValuesParser::new(IMAGE_QUALITIES)),
        )
        .arg(arg_config(
            ConfigKey::EmailAddress,
            "Sender mailbox for transcripts. Also the SMTP login.",
        ))
        .arg(arg_config(
            ConfigKey::EmailPassword,
            "SMTP password, usually an app password for the sender mailbox.",
        ))
        .arg(arg_config(ConfigKey::SmtpHost, "SMTP relay host."))
        .arg(arg_config(ConfigKey::SmtpPort, "SMTP relay port using implicit TLS."));
}

/// Parses arguments and runs one-shot subcommands. Returns true when the
/// web server should start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    println!("{}", log_dir().join("debug.log").to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    println!("{}", ConfigKey::VARIANTS.join("\n"));
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(false);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        Some(("serve", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}
