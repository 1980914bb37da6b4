//! Mapping from GitHub language labels to highlighter grammar identifiers.

use std::{collections::HashMap, sync::LazyLock};

use folio_parser::syntax::PLAINTEXT;

/// Language labels as reported by GitHub, paired with grammar identifiers.
const LANGUAGES: &[(&str, &str)] = &[
    ("ABAP", "abap"),
    ("ActionScript", "actionscript-3"),
    ("Ada", "ada"),
    ("ApacheConf", "apache"),
    ("Apex", "apex"),
    ("APL", "apl"),
    ("AppleScript", "applescript"),
    ("AsciiDoc", "asciidoc"),
    ("Assembly", "asm"),
    ("Astro", "astro"),
    ("AWK", "awk"),
    ("Ballerina", "ballerina"),
    ("Batchfile", "bat"),
    ("Berry", "berry"),
    ("BibTeX", "bibtex"),
    ("Bicep", "bicep"),
    ("Blade", "blade"),
    ("C", "c"),
    ("C#", "csharp"),
    ("C++", "cpp"),
    ("Cadence", "cadence"),
    ("Cairo", "cairo"),
    ("Clarity", "clarity"),
    ("Clojure", "clojure"),
    ("Closure Templates", "soy"),
    ("CMake", "cmake"),
    ("COBOL", "cobol"),
    ("CodeQL", "ql"),
    ("CoffeeScript", "coffee"),
    ("Common Lisp", "common-lisp"),
    ("Coq", "coq"),
    ("Crystal", "crystal"),
    ("CSS", "css"),
    ("CSV", "csv"),
    ("CUE", "cue"),
    ("Cypher", "cypher"),
    ("D", "d"),
    ("Dart", "dart"),
    ("DAX", "dax"),
    ("Diff", "diff"),
    ("Dockerfile", "docker"),
    ("Dotenv", "dotenv"),
    ("Dream Maker", "dream-maker"),
    ("Edge", "edge"),
    ("Elixir", "elixir"),
    ("Elm", "elm"),
    ("Emacs Lisp", "emacs-lisp"),
    ("ERB", "erb"),
    ("Erlang", "erlang"),
    ("F#", "fsharp"),
    ("Fennel", "fennel"),
    ("Fish", "fish"),
    ("Fluent", "fluent"),
    ("Fortran", "fortran-fixed-form"),
    ("Fortran Free Form", "fortran-free-form"),
    ("GDScript", "gdscript"),
    ("Genie", "genie"),
    ("Gherkin", "gherkin"),
    ("Git Commit", "git-commit"),
    ("Git Rebase", "git-rebase"),
    ("Gleam", "gleam"),
    ("Glimmer JS", "glimmer-js"),
    ("Glimmer TS", "glimmer-ts"),
    ("GLSL", "glsl"),
    ("Gnuplot", "gnuplot"),
    ("Go", "go"),
    ("Go Module", "go"),
    ("Gradle", "groovy"),
    ("GraphQL", "graphql"),
    ("Graphviz (DOT)", "dot"),
    ("Groovy", "groovy"),
    ("Hack", "hack"),
    ("Haml", "haml"),
    ("Handlebars", "handlebars"),
    ("Haskell", "haskell"),
    ("Haxe", "haxe"),
    ("HCL", "hcl"),
    ("Hjson", "hjson"),
    ("HLSL", "hlsl"),
    ("HTML", "html"),
    ("HTML+ERB", "erb"),
    ("HTML+Razor", "razor"),
    ("HTTP", "http"),
    ("Hurl", "hurl"),
    ("Hy", "hy"),
    ("Imba", "imba"),
    ("INI", "ini"),
    ("Java", "java"),
    ("Java Properties", "properties"),
    ("JavaScript", "javascript"),
    ("Jinja", "jinja"),
    ("Jison", "jison"),
    ("JSON", "json"),
    ("JSON with Comments", "jsonc"),
    ("JSON5", "json5"),
    ("JSONLD", "json"),
    ("Jsonnet", "jsonnet"),
    ("Julia", "julia"),
    ("Just", "just"),
    ("KDL", "kdl"),
    ("Kotlin", "kotlin"),
    ("Kusto", "kusto"),
    ("LaTeX", "latex"),
    ("Lean", "lean"),
    ("Less", "less"),
    ("Liquid", "liquid"),
    ("LLVM", "llvm"),
    ("Logo", "logo"),
    ("Lua", "lua"),
    ("Luau", "luau"),
    ("Makefile", "make"),
    ("Markdown", "markdown"),
    ("Marko", "marko"),
    ("MATLAB", "matlab"),
    ("MDX", "mdx"),
    ("Mermaid", "mermaid"),
    ("MIPS Assembly", "mipsasm"),
    ("Mojo", "mojo"),
    ("Motorola 68K Assembly", "asm"),
    ("Move", "move"),
    ("Nextflow", "nextflow"),
    ("Nginx", "nginx"),
    ("Nim", "nim"),
    ("Nix", "nix"),
    ("Nushell", "nushell"),
    ("Objective-C", "objective-c"),
    ("Objective-C++", "objective-cpp"),
    ("OCaml", "ocaml"),
    ("Pascal", "pascal"),
    ("Perl", "perl"),
    ("PHP", "php"),
    ("Plain Text", "plaintext"),
    ("PLSQL", "plsql"),
    ("PostCSS", "postcss"),
    ("PowerQuery", "powerquery"),
    ("PowerShell", "powershell"),
    ("Prisma", "prisma"),
    ("Prolog", "prolog"),
    ("Protocol Buffer", "proto"),
    ("Pug", "pug"),
    ("Puppet", "puppet"),
    ("PureScript", "purescript"),
    ("Python", "python"),
    ("QML", "qml"),
    ("R", "r"),
    ("Racket", "racket"),
    ("Raku", "raku"),
    ("Regular Expression", "regexp"),
    ("reStructuredText", "rst"),
    ("Riot", "riot"),
    ("Ruby", "ruby"),
    ("Rust", "rust"),
    ("SAS", "sas"),
    ("Sass", "sass"),
    ("Scala", "scala"),
    ("Scheme", "scheme"),
    ("SCSS", "scss"),
    ("ShaderLab", "shaderlab"),
    ("Shell", "shellscript"),
    ("ShellSession", "shellsession"),
    ("Smalltalk", "smalltalk"),
    ("Solidity", "solidity"),
    ("SPARQL", "sparql"),
    ("SQL", "sql"),
    ("SSH Config", "ssh-config"),
    ("Starlark", "python"),
    ("Stata", "stata"),
    ("Stylus", "stylus"),
    ("Svelte", "svelte"),
    ("Swift", "swift"),
    ("SystemVerilog", "system-verilog"),
    ("Tcl", "tcl"),
    ("Terraform", "terraform"),
    ("TeX", "tex"),
    ("Text", "plaintext"),
    ("TOML", "toml"),
    ("TSV", "tsv"),
    ("TSX", "tsx"),
    ("Turtle", "turtle"),
    ("Twig", "twig"),
    ("TypeScript", "typescript"),
    ("TypeSpec", "typespec"),
    ("Typst", "typst"),
    ("Unix Assembly", "asm"),
    ("V", "v"),
    ("Vala", "vala"),
    ("VBA", "vb"),
    ("Verilog", "verilog"),
    ("VHDL", "vhdl"),
    ("Vim Script", "viml"),
    ("Visual Basic .NET", "vb"),
    ("Vue", "vue"),
    ("Vyper", "vyper"),
    ("WebAssembly", "wasm"),
    ("Wenyan", "wenyan"),
    ("WGSL", "wgsl"),
    ("Wolfram Language", "wolfram"),
    ("XML", "xml"),
    ("XSLT", "xsl"),
    ("YAML", "yaml"),
    ("ZenScript", "zenscript"),
    ("Zig", "zig"),
];

static GRAMMARS: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    LANGUAGES
        .iter()
        .map(|(label, grammar)| (label.to_lowercase(), *grammar))
        .collect()
});

/// Grammar identifier for a GitHub language label.
///
/// Lookup ignores case. Unknown labels map to [`PLAINTEXT`].
pub fn grammar_for(label: &str) -> &'static str {
    GRAMMARS
        .get(&label.trim().to_lowercase())
        .copied()
        .unwrap_or(PLAINTEXT)
}

/// Number of known language labels.
pub fn known_languages() -> usize {
    LANGUAGES.len()
}
