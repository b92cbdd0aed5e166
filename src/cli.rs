use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "sunzip")]
#[command(version)]
#[command(about = "A streaming unzip that reads archives front to back", long_about = None)]
#[command(after_help = "Examples:\n  \
  curl -s https://example.com/a.zip | sunzip -   extract while downloading\n  \
  sunzip -l https://example.com/archive.zip     list a remote ZIP in one pass\n  \
  sunzip -p data1.zip notes.txt | more          send one member to a pager")]
pub struct Cli {
    /// ZIP file path, HTTP URL, or - for standard input
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Files to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely, with sizes known only after each entry is read
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Test archive data: decompress and check every CRC
    #[arg(short = 't')]
    pub test: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Print decoder diagnostics to stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        crate::io::is_http_url(&self.file)
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Whether an entry name passes the FILES filters and the -x excludes.
    pub fn selects(&self, name: &str) -> bool {
        if !self.files.is_empty() {
            let matches = self.files.iter().any(|f| {
                if has_glob_chars(f) {
                    glob_match(f, name)
                } else {
                    // No wildcards: exact match on the full path or the base name
                    name == f || name.rsplit('/').next() == Some(f.as_str())
                }
            });
            if !matches {
                return false;
            }
        }

        !self
            .exclude
            .iter()
            .any(|x| name.contains(x.as_str()) || glob_match(x, name))
    }
}

/// Check if a pattern contains glob wildcard characters.
///
/// # Arguments
///
/// * `pattern` - The pattern to check
///
/// # Returns
///
/// Returns `true` if the pattern contains `*` or `?` wildcards.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Glob matching where `*` matches any run of characters and `?` exactly one.
///
/// Iterative, backtracking only to the most recent `*`.
///
/// # Arguments
///
/// * `pattern` - The glob pattern to match against
/// * `text` - The entry name to check
///
/// # Returns
///
/// Returns `true` if the whole of `text` matches the pattern.
///
/// # Examples
///
/// ```
/// use sunzip::cli::glob_match;
///
/// assert!(glob_match("*.txt", "readme.txt"));
/// assert!(glob_match("file?.dat", "file1.dat"));
/// assert!(!glob_match("*.txt", "readme.md"));
/// ```
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((star_p, star_t)) => {
                    p = star_p + 1;
                    t = star_t + 1;
                    star = Some((star_p, star_t + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("sunzip").chain(args.iter().copied()))
    }

    #[test]
    fn glob_wildcards() {
        assert!(glob_match("*.txt", "readme.txt"));
        assert!(glob_match("file?.dat", "file1.dat"));
        assert!(glob_match("a*b*c", "aXXbYYc"));
        assert!(!glob_match("*.txt", "readme.md"));
        assert!(!glob_match("?", ""));
    }

    #[test]
    fn filters_and_excludes() {
        let c = cli(&["a.zip", "*.txt", "logo.png", "-x", "secret"]);
        assert!(c.selects("docs/readme.txt"));
        assert!(c.selects("img/logo.png"));
        assert!(!c.selects("img/other.png"));
        assert!(!c.selects("secret.txt"));
    }

    #[test]
    fn pipe_implies_quiet() {
        assert!(cli(&["-p", "-"]).is_quiet());
        assert!(!cli(&["a.zip"]).is_quiet());
        assert!(cli(&["https://host/a.zip"]).is_http_url());
    }
}
