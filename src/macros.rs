// Compile a literal regex once and hand out a `&'static Regex`.
// The pattern is a literal, so a bad one fails on first use in tests.
macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($re).unwrap())
    }};
}
