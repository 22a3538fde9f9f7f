use anyhow::bail;
use clap::Subcommand;
use serde::Serialize;

use crate::auth::{mint_token, Claims, JwtDecoder, TokenDecode, TokenDecoder};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::scope::{ScopePredicate, SecurityScope};

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Decode a token and show the derived scope and filters")]
    Inspect {
        #[arg(help = "Bearer token (without the 'Bearer ' prefix)")]
        token: String,
        #[arg(long, help = "Secret to verify with (defaults to JWT_SECRET)")]
        secret: Option<String>,
    },

    #[command(about = "Sign a development token (refused in production)")]
    Mint {
        #[arg(long, help = "Subject id")]
        id: i64,
        #[arg(long, help = "SUPERADMIN, ADMIN, SUPERVISOR or GH")]
        role: String,
        #[arg(long, help = "Home site id")]
        site: Option<i64>,
        #[arg(long, help = "Home subsite id")]
        subsite: Option<i64>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long, help = "Lifetime in hours (defaults to configured expiry)")]
        hours: Option<u64>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectReport {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<Claims>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<SecurityScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_filter: Option<ScopePredicate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsite_filter: Option<ScopePredicate>,
}

/// Run a token through the same decode and derive steps the server uses
pub async fn inspect(decoder: &dyn TokenDecoder, token: &str) -> InspectReport {
    let claims = match decoder.decode(token).await {
        TokenDecode::Valid(claims) => claims,
        TokenDecode::Invalid(reason) => {
            return InspectReport {
                valid: false,
                error: Some(reason),
                claims: None,
                scope: None,
                site_filter: None,
                subsite_filter: None,
            }
        }
    };

    match SecurityScope::derive(&claims) {
        Ok(scope) => InspectReport {
            valid: true,
            error: None,
            site_filter: Some(scope.site_filter()),
            subsite_filter: Some(scope.subsite_filter()),
            claims: Some(claims),
            scope: Some(scope),
        },
        Err(e) => InspectReport {
            valid: true,
            error: Some(e.to_string()),
            claims: Some(claims),
            scope: None,
            site_filter: None,
            subsite_filter: None,
        },
    }
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat, config: &AppConfig) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Inspect { token, secret } => {
            let secret = secret.unwrap_or_else(|| config.security.jwt_secret.clone());
            let decoder = JwtDecoder::new(&secret)?;
            let report = inspect(&decoder, token.trim()).await;

            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Text => print_report(&report),
            }
            Ok(())
        }
        TokenCommands::Mint { id, role, site, subsite, username, hours } => {
            if config.is_production() {
                bail!("refusing to mint tokens in production");
            }

            let hours = hours.unwrap_or(config.security.jwt_expiry_hours);
            let mut claims = Claims::new(id, role, site, subsite, hours);
            if let Some(username) = username {
                claims = claims.with_username(username);
            }

            let token = mint_token(&claims, &config.security.jwt_secret)?;
            println!("{}", token);
            Ok(())
        }
    }
}

fn print_report(report: &InspectReport) {
    println!("valid:          {}", report.valid);
    if let Some(error) = &report.error {
        println!("error:          {}", error);
    }
    if let Some(scope) = &report.scope {
        println!("user:           {}", scope.subject_id());
        println!("role:           {}", scope.role());
        println!("site:           {:?}", scope.site_id());
        println!("subsite:        {:?}", scope.subsite_id());
    }
    if let Some(filter) = &report.site_filter {
        println!("site filter:    {}", filter.to_where());
    }
    if let Some(filter) = &report.subsite_filter {
        println!("subsite filter: {}", filter.to_where());
    }
}
