use seraphim_data::InvalidInput;

use crate::utils::converters::{parse_bool, ImageType};

/// Arguments shared by the image commands: an optional url, positionals and `--flag value` pairs.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImageArgs {
    pub url: Option<String>,
    pub positional: Vec<String>,
    pub shrink: Option<bool>,
    pub format: Option<ImageType>,
    pub quality: Option<u8>,
}

fn is_url(token: &str) -> bool {
    token.starts_with("http://") || token.starts_with("https://")
}

fn parse_quality(value: &str) -> Result<u8, InvalidInput> {
    value
        .parse::<u8>()
        .ok()
        .filter(|quality| *quality <= 100)
        .ok_or_else(|| InvalidInput::new("Quality must be a number between 0-100!"))
}

impl ImageArgs {
    /// `flags` lists the flag names this command accepts, without dashes.
    pub fn parse(input: &str, flags: &[&str]) -> Result<Self, InvalidInput> {
        let mut args = ImageArgs::default();
        let mut tokens = input.split_whitespace();

        while let Some(token) = tokens.next() {
            if let Some(flag) = token.strip_prefix("--").or_else(|| token.strip_prefix('-')) {
                let flag = flag.to_lowercase();
                if !flags.contains(&flag.as_str()) {
                    return Err(InvalidInput::new(format!("Unknown flag `{token}`.")));
                }

                let value = tokens.next().ok_or_else(|| {
                    InvalidInput::new(format!("The flag `{token}` needs a value."))
                })?;

                match flag.as_str() {
                    "shrink" => args.shrink = Some(parse_bool(value)?),
                    "format" => args.format = Some(value.parse()?),
                    "quality" => args.quality = Some(parse_quality(value)?),
                    _ => return Err(InvalidInput::new(format!("Unknown flag `{token}`."))),
                }
                continue;
            }

            // urls wrapped in <> don't embed.
            let token = token.trim_start_matches('<').trim_end_matches('>');
            if args.url.is_none() && args.positional.is_empty() && is_url(token) {
                args.url = Some(token.to_owned());
            } else {
                args.positional.push(token.to_owned());
            }
        }

        Ok(args)
    }
}
