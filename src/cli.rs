//! Command-line interface for mishap.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use mishap::rotation::RotationMode;

#[derive(Parser, Debug)]
#[command(
    name = "mishap",
    version,
    about = "HTTP error pages, served live or exported as a static site",
    long_about = "Mishap resolves an HTTP status code to a rendered error page in a \
                  negotiated format (HTML, JSON, XML or plain text). Run `serve` to \
                  answer requests live, or `build` to export every page as static files."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    #[command(visible_alias = "s", alias = "server")]
    Serve(ServeArgs),

    /// Export error pages as a static site
    #[command(visible_alias = "b")]
    Build(BuildArgs),
}

/// Flags shared by `serve` and `build`.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Add a template from a file (the filename without extension becomes the template name)
    #[arg(long = "add-template", value_name = "PATH")]
    pub add_template: Vec<PathBuf>,

    /// Disable a built-in or added template by name
    #[arg(long = "disable-template", value_name = "NAME")]
    pub disable_template: Vec<String>,

    /// Describe an HTTP code as code=message/description; the code may contain '*' wildcards
    #[arg(long = "add-code", value_name = "CODE=MSG/DESC")]
    pub add_code: Vec<String>,

    /// Disable localization hooks in templates
    #[arg(long, env = "DISABLE_L10N")]
    pub disable_l10n: bool,

    /// Keep HTML output as the template produced it
    #[arg(long)]
    pub disable_minification: bool,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// IP (v4 or v6) address to listen on
    #[arg(short = 'l', long, env = "LISTEN_ADDR", default_value = "0.0.0.0")]
    pub listen: IpAddr,

    /// TCP port number
    #[arg(short, long, env = "LISTEN_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Name of the template to use for rendering error pages
    #[arg(short = 't', long, env = "TEMPLATE_NAME")]
    pub template_name: Option<String>,

    /// Templates automatic rotation mode (disabled/random-on-startup/random-on-each-request)
    #[arg(
        long,
        env = "TEMPLATES_ROTATION_MODE",
        default_value_t = RotationMode::Disabled,
        value_parser = parse_rotation_mode
    )]
    pub rotation_mode: RotationMode,

    /// Show request details in the error page response (if supported by the template)
    #[arg(long, env = "SHOW_DETAILS")]
    pub show_details: bool,

    /// The code of the default error page, rendered when a code is not specified
    #[arg(
        long,
        env = "DEFAULT_ERROR_PAGE",
        default_value_t = 404,
        value_parser = parse_http_code
    )]
    pub default_error_page: u16,

    /// The HTTP response code for the default (index) page
    #[arg(
        long,
        env = "DEFAULT_HTTP_CODE",
        default_value_t = 200,
        value_parser = parse_http_code
    )]
    pub default_http_code: u16,

    /// HTTP headers proxied from the original request to the response (comma-separated)
    #[arg(long, env = "PROXY_HTTP_HEADERS", value_delimiter = ',', value_name = "NAME")]
    pub proxy_headers: Vec<String>,

    /// Override the default error page response in JSON format
    #[arg(long, env = "RESPONSE_JSON_FORMAT", value_name = "TEMPLATE")]
    pub json_format: Option<String>,

    /// Override the default error page response in XML format
    #[arg(long, env = "RESPONSE_XML_FORMAT", value_name = "TEMPLATE")]
    pub xml_format: Option<String>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Directory to write generated pages into (must exist)
    #[arg(long = "target-dir", value_name = "DIR", default_value = ".")]
    pub target_dir: PathBuf,

    /// Generate an index.html listing all templates and codes
    #[arg(long)]
    pub index: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

fn parse_rotation_mode(value: &str) -> Result<RotationMode, String> {
    value.parse().map_err(|e: mishap::Error| e.to_string())
}

fn parse_http_code(value: &str) -> Result<u16, String> {
    let code: u16 = value
        .parse()
        .map_err(|_| format!("wrong HTTP code [{}]", value))?;
    if code > 999 {
        return Err(format!("wrong HTTP code [{}]: out of range", code));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_serve() {
        let cli = Cli::try_parse_from([
            "mishap",
            "serve",
            "--port",
            "9000",
            "--rotation-mode",
            "random-on-startup",
            "--add-code",
            "599=Custom/Desc",
        ])
        .unwrap();

        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, 9000);
                assert_eq!(args.rotation_mode, RotationMode::RandomOnStartup);
                assert_eq!(args.common.add_code, vec!["599=Custom/Desc"]);
            }
            _ => panic!("expected serve command"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_values() {
        assert!(Cli::try_parse_from(["mishap", "serve", "--listen", "not-an-ip"]).is_err());
        assert!(Cli::try_parse_from(["mishap", "serve", "--rotation-mode", "sometimes"]).is_err());
        assert!(
            Cli::try_parse_from(["mishap", "serve", "--default-error-page", "1404"]).is_err()
        );
    }

    #[test]
    fn test_cli_parses_build() {
        let cli = Cli::try_parse_from([
            "mishap",
            "build",
            "--target-dir",
            "/tmp/out",
            "--index",
            "--disable-template",
            "ghost",
        ])
        .unwrap();

        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.target_dir, PathBuf::from("/tmp/out"));
                assert!(args.index);
                assert_eq!(args.common.disable_template, vec!["ghost"]);
            }
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn test_proxy_headers_split_on_comma() {
        let cli = Cli::try_parse_from([
            "mishap",
            "serve",
            "--proxy-headers",
            "X-Request-ID,X-Trace-ID",
        ])
        .unwrap();

        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.proxy_headers, vec!["X-Request-ID", "X-Trace-ID"]);
            }
            _ => panic!("expected serve command"),
        }
    }
}
