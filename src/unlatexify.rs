use once_cell::sync::Lazy;
use regex::Regex;

static NEWBLOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\newblock").unwrap());

static BLANKS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// LaTeX accent/ligature escape sequences and their Unicode equivalents.
/// See http://arxiv.org/help/prep#author
///
/// Applied in order, each exactly once. Accent-command forms (`\'A`,
/// `\k{A}`, ...) come before the bare `~` rule so a tilde accent is never
/// corrupted into a space; no replacement output is itself a valid pattern,
/// so the whole pass is idempotent.
const REPLACEMENTS: &[(&str, &str)] = &[
    (r#"\"A"#, "Ä"),
    (r#"\"a"#, "ä"),
    (r"\'A", "Á"),
    (r"\'a", "á"),
    (r"\.A", "Ȧ"),
    (r"\.a", "ȧ"),
    (r"\=A", "Ā"),
    (r"\=a", "ā"),
    (r"\^A", "Â"),
    (r"\^a", "â"),
    (r"\`A", "À"),
    (r"\`a", "à"),
    (r"\k{A}", "Ą"),
    (r"\k{a}", "ą"),
    (r"\r{A}", "Å"),
    (r"\r{a}", "å"),
    (r"\u{A}", "Ă"),
    (r"\u{a}", "ă"),
    (r"\v{A}", "Ǎ"),
    (r"\v{a}", "ǎ"),
    (r"\~A", "Ã"),
    (r"\~a", "ã"),
    (r"\'C", "Ć"),
    (r"\'c", "ć"),
    (r"\.C", "Ċ"),
    (r"\.c", "ċ"),
    (r"\^C", "Ĉ"),
    (r"\^c", "ĉ"),
    (r"\c{C}", "Ç"),
    (r"\c{c}", "ç"),
    (r"\v{C}", "Č"),
    (r"\v{c}", "č"),
    (r"\v{D}", "Ď"),
    (r"\v{d}", "ď"),
    (r#"\"E"#, "Ë"),
    (r#"\"e"#, "ë"),
    (r"\'E", "É"),
    (r"\'e", "é"),
    (r"\.E", "Ė"),
    (r"\.e", "ė"),
    (r"\=E", "Ē"),
    (r"\=e", "ē"),
    (r"\^E", "Ê"),
    (r"\^e", "ê"),
    (r"\`E", "È"),
    (r"\`e", "è"),
    (r"\c{E}", "Ȩ"),
    (r"\c{e}", "ȩ"),
    (r"\k{E}", "Ę"),
    (r"\k{e}", "ę"),
    (r"\u{E}", "Ĕ"),
    (r"\u{e}", "ĕ"),
    (r"\v{E}", "Ě"),
    (r"\v{e}", "ě"),
    (r"\.G", "Ġ"),
    (r"\.g", "ġ"),
    (r"\^G", "Ĝ"),
    (r"\^g", "ĝ"),
    (r"\c{G}", "Ģ"),
    (r"\c{g}", "ģ"),
    (r"\u{G}", "Ğ"),
    (r"\u{g}", "ğ"),
    (r"\v{G}", "Ǧ"),
    (r"\v{g}", "ǧ"),
    (r"\^H", "Ĥ"),
    (r"\^h", "ĥ"),
    (r"\v{H}", "Ȟ"),
    (r"\v{h}", "ȟ"),
    (r#"\"I"#, "Ï"),
    (r#"\"i"#, "ï"),
    (r"\'I", "Í"),
    (r"\'i", "í"),
    (r"\.I", "İ"),
    (r"\=I", "Ī"),
    (r"\=i", "ī"),
    (r"\^I", "Î"),
    (r"\^i", "î"),
    (r"\`I", "Ì"),
    (r"\`i", "ì"),
    (r"\k{I}", "Į"),
    (r"\k{i}", "į"),
    (r"\u{I}", "Ĭ"),
    (r"\u{i}", "ĭ"),
    (r"\v{I}", "Ǐ"),
    (r"\v{i}", "ǐ"),
    (r"\~I", "Ĩ"),
    (r"\~i", "ĩ"),
    (r"\^J", "Ĵ"),
    (r"\^j", "ĵ"),
    (r"\c{K}", "Ķ"),
    (r"\c{k}", "ķ"),
    (r"\v{K}", "Ǩ"),
    (r"\v{k}", "ǩ"),
    (r"\'L", "Ĺ"),
    (r"\'l", "ĺ"),
    (r"\c{L}", "Ļ"),
    (r"\c{l}", "ļ"),
    (r"\v{L}", "Ľ"),
    (r"\v{l}", "ľ"),
    (r"\'N", "Ń"),
    (r"\'n", "ń"),
    (r"\c{N}", "Ņ"),
    (r"\c{n}", "ņ"),
    (r"\v{N}", "Ň"),
    (r"\v{n}", "ň"),
    (r"\~N", "Ñ"),
    (r"\~n", "ñ"),
    (r#"\"O"#, "Ö"),
    (r#"\"o"#, "ö"),
    (r"\'O", "Ó"),
    (r"\'o", "ó"),
    (r"\.O", "Ȯ"),
    (r"\.o", "ȯ"),
    (r"\=O", "Ō"),
    (r"\=o", "ō"),
    (r"\^O", "Ô"),
    (r"\^o", "ô"),
    (r"\`O", "Ò"),
    (r"\`o", "ò"),
    (r"\H{O}", "Ő"),
    (r"\H{o}", "ő"),
    (r"\k{O}", "Ǫ"),
    (r"\k{o}", "ǫ"),
    (r"\u{O}", "Ŏ"),
    (r"\u{o}", "ŏ"),
    (r"\v{O}", "Ǒ"),
    (r"\v{o}", "ǒ"),
    (r"\~O", "Õ"),
    (r"\~o", "õ"),
    (r"\'R", "Ŕ"),
    (r"\'r", "ŕ"),
    (r"\c{R}", "Ŗ"),
    (r"\c{r}", "ŗ"),
    (r"\v{R}", "Ř"),
    (r"\v{r}", "ř"),
    (r"\'S", "Ś"),
    (r"\'s", "ś"),
    (r"\^S", "Ŝ"),
    (r"\^s", "ŝ"),
    (r"\c{S}", "Ş"),
    (r"\c{s}", "ş"),
    (r"\v{S}", "Š"),
    (r"\v{s}", "š"),
    (r"\c{T}", "Ţ"),
    (r"\c{t}", "ţ"),
    (r"\v{T}", "Ť"),
    (r"\v{t}", "ť"),
    (r#"\"U"#, "Ü"),
    (r#"\"u"#, "ü"),
    (r"\'U", "Ú"),
    (r"\'u", "ú"),
    (r"\=U", "Ū"),
    (r"\=u", "ū"),
    (r"\^U", "Û"),
    (r"\^u", "û"),
    (r"\`U", "Ù"),
    (r"\`u", "ù"),
    (r"\H{U}", "Ű"),
    (r"\H{u}", "ű"),
    (r"\k{U}", "Ų"),
    (r"\k{u}", "ų"),
    (r"\r{U}", "Ů"),
    (r"\r{u}", "ů"),
    (r"\u{U}", "Ŭ"),
    (r"\u{u}", "ŭ"),
    (r"\v{U}", "Ǔ"),
    (r"\v{u}", "ǔ"),
    (r"\~U", "Ũ"),
    (r"\~u", "ũ"),
    (r"\^W", "Ŵ"),
    (r"\^w", "ŵ"),
    (r#"\"Y"#, "Ÿ"),
    (r#"\"y"#, "ÿ"),
    (r"\'Y", "Ý"),
    (r"\'y", "ý"),
    (r"\=Y", "Ȳ"),
    (r"\=y", "ȳ"),
    (r"\^Y", "Ŷ"),
    (r"\^y", "ŷ"),
    (r"\'Z", "Ź"),
    (r"\'z", "ź"),
    (r"\.Z", "Ż"),
    (r"\.z", "ż"),
    (r"\v{Z}", "Ž"),
    (r"\v{z}", "ž"),
    (r"{\aa}", "å"),
    (r"{\AA}", "Å"),
    (r"{\ae}", "æ"),
    (r"{\AE}", "Æ"),
    (r"{\DH}", "Ð"),
    (r"{\dh}", "ð"),
    (r"{\dj}", "đ"),
    (r"{\DJ}", "Đ"),
    (r"{\eth}", "ð"),
    (r"{\ETH}", "Ð"),
    (r"{\i}", "ı"),
    (r"{\l}", "ł"),
    (r"{\L}", "Ł"),
    (r"{\ng}", "ŋ"),
    (r"{\NG}", "Ŋ"),
    (r"{\O}", "Ø"),
    (r"{\o}", "ø"),
    (r"{\oe}", "œ"),
    (r"{\OE}", "Œ"),
    (r"{\ss}", "ß"),
    (r"{\th}", "þ"),
    (r"{\TH}", "Þ"),
    ("~", " "),
    (r"\mbox{.}", ""),
];

/// Convert LaTeX accent/ligature escapes to Unicode and normalize
/// whitespace. Pure and idempotent: normalizing already-normalized text
/// returns it unchanged.
pub fn unlatexify(text: &str) -> String {
    let mut out = NEWBLOCK_RE.replace_all(text, " ").into_owned();
    for (pattern, unicode) in REPLACEMENTS {
        if out.contains(pattern) {
            out = out.replace(pattern, unicode);
        }
    }
    // Collapse last: the ~ and \mbox{.} rules can introduce runs of spaces,
    // and a leftover run would make a second pass observable.
    BLANKS_RE.replace_all(&out, " ").into_owned()
}
