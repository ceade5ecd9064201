/// Long flags that operators type Go-style, with a single dash.
const LONG_FLAGS: &[&str] = &[
    "ip",
    "label",
    "cwd",
    "show-full",
    "install",
    "delay",
    "data-dir",
    "user",
    "terraform-dir",
    "help",
    "version",
];

/// Rewrites `-ip 10.0.0.5` and `-delay=5m` into the `--ip` / `--delay=5m`
/// form clap expects. Anything after a bare `--` is left alone, as are
/// unknown single-dash arguments so clap can report them.
pub fn normalize_go_style_flags<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out = Vec::new();
    let mut passthrough = false;
    for (index, arg) in args.into_iter().enumerate() {
        let arg: String = arg.into();
        if index == 0 || passthrough {
            out.push(arg);
            continue;
        }
        if arg == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }
        out.push(rewrite_single_dash(&arg).unwrap_or(arg));
    }
    out
}

fn rewrite_single_dash(arg: &str) -> Option<String> {
    let body = arg.strip_prefix('-')?;
    if body.starts_with('-') {
        return None;
    }
    let name = body.split('=').next().unwrap_or(body);
    if LONG_FLAGS.contains(&name) {
        Some(format!("-{}", arg))
    } else {
        None
    }
}
