//! Translation of a single project declaration into rules.
//!
//! [`ProjectBuilder`] turns a [`ProjectDecl`] into a [`ProjectFragment`]:
//! one compile rule per source, a link rule, or the two rules of a
//! precompiled header, followed by the alias and post-build hooks. The shared
//! graph is only read, to skip intermediates that another project already
//! registered; every error is raised before the caller merges anything.

use std::collections::BTreeSet;

use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use super::language::{Language, extension};
use super::{ProjectFragment, Rule, RuleGraph};
use crate::ast::{Command, ProjectDecl, shell_word};
use crate::headers::HeaderResolver;

/// Object suffix appended to every intermediate.
const OBJECT_SUFFIX: &str = ".o";
/// Macro naming the precompiled-header extension.
const PCH_EXT: &str = "$(PCHEXT)";

/// Fatal configuration errors for a single project.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ProjectError {
    /// Inputs of different languages were mixed without an explicit tag.
    #[error("project '{project}' mixes '{existing}' with '{incoming}' (input '{input}')")]
    #[diagnostic(
        code(kumiki::project::language_conflict),
        help("set `lang` explicitly to `c++` to mix C and C++ sources")
    )]
    LanguageConflict {
        /// Project being built.
        project: String,
        /// Language established by earlier inputs.
        existing: Language,
        /// Language of the offending input.
        incoming: Language,
        /// Offending input.
        input: String,
    },

    /// An input's extension does not name a C or C++ source.
    #[error("project '{project}' has input '{input}' with unrecognised extension '{extension}'")]
    #[diagnostic(code(kumiki::project::unsupported_input_type))]
    UnsupportedInputType {
        /// Project being built.
        project: String,
        /// Offending input.
        input: String,
        /// Extension including the dot, or empty.
        extension: String,
    },

    /// The explicit language tag is unknown.
    #[error("project '{project}' has unrecognised language '{language}'")]
    #[diagnostic(
        code(kumiki::project::unsupported_language),
        help("supported languages are c, c++, c-header and c++-header")
    )]
    UnsupportedLanguage {
        /// Project being built.
        project: String,
        /// Tag as written in the manifest.
        language: String,
    },
}

/// Builds rule fragments from project declarations.
#[derive(Debug, Clone, Copy)]
pub struct ProjectBuilder<'a> {
    headers: &'a HeaderResolver,
}

impl<'a> ProjectBuilder<'a> {
    /// Create a builder that scans headers with `headers`.
    #[must_use]
    pub const fn new(headers: &'a HeaderResolver) -> Self {
        Self { headers }
    }

    /// Build the rules for `decl`.
    ///
    /// `graph` holds the rules of previously merged projects; an intermediate
    /// object already present there is referenced but not registered again.
    ///
    /// # Errors
    ///
    /// Returns a [`ProjectError`] for unknown language tags, unknown input
    /// extensions and conflicting input languages.
    pub fn build(&self, decl: &ProjectDecl, graph: &RuleGraph) -> Result<ProjectFragment, ProjectError> {
        let explicit = decl
            .lang
            .as_deref()
            .map(|tag| {
                tag.parse::<Language>()
                    .map_err(|_| ProjectError::UnsupportedLanguage {
                        project: decl.name.clone(),
                        language: tag.to_owned(),
                    })
            })
            .transpose()?;

        let mut state = ProjectState::new(decl, graph);
        let out = match explicit {
            Some(lang) if lang.is_header() => self.precompiled_header(&mut state, lang),
            _ => self.sources(&mut state, explicit)?,
        };
        Ok(state.finish(out))
    }

    fn sources(&self, state: &mut ProjectState<'_>, explicit: Option<Language>) -> Result<String, ProjectError> {
        let decl = state.decl;
        let mut lang = explicit;
        for input in &decl.inputs {
            let Some(source_lang) = Language::from_source(input) else {
                return Err(ProjectError::UnsupportedInputType {
                    project: decl.name.clone(),
                    input: input.clone(),
                    extension: extension(input).to_owned(),
                });
            };
            lang = Some(merge_language(decl, explicit, lang, source_lang, input)?);
        }

        for input in &decl.inputs {
            if let Some(source_lang) = Language::from_source(input) {
                let compiler = state.compiler(source_lang);
                self.intermediate(state, &compiler, input);
            }
        }

        let Some(link_lang) = lang else {
            // No inputs: the bare name is a phony hook target.
            let name = decl.name.clone();
            debug!(project = %name, "registering custom project target");
            state.fragment.rules.insert(name.clone(), Rule::default());
            state.fragment.phonys.insert(name.clone());
            return Ok(name);
        };
        let out = decl.out_path();
        let compiler = state.compiler(link_lang);
        state.link(&compiler, &out);
        Ok(out)
    }

    fn intermediate(&self, state: &mut ProjectState<'_>, compiler: &[String], input: &str) {
        let target = format!("{}{input}{OBJECT_SUFFIX}", state.decl.intdir());
        state.objects.insert(target.clone());
        if state.graph.contains(&target) || state.fragment.rules.contains_key(&target) {
            debug!(target = %target, "intermediate already registered");
            return;
        }
        let mut prerequisites = self.headers.resolve(input);
        prerequisites.extend(state.extdeps.iter().cloned());
        let mut compile = compiler.to_vec();
        compile.extend(["-o", "$@", "-c", input].map(str::to_owned));
        let rule = Rule {
            prerequisites,
            commands: vec![ensure_dir(), Command::Tokens(compile)],
        };
        debug!(target = %target, "registering compile rule");
        state.fragment.insert_if_absent(&target, rule);
    }

    fn precompiled_header(&self, state: &mut ProjectState<'_>, lang: Language) -> String {
        let decl = state.decl;
        let out = decl.out_path();
        let mut prerequisites = BTreeSet::new();
        let mut commands = vec![ensure_dir(), Command::tokens(["rm", "-f", "$@"])];
        for input in &decl.inputs {
            let line = if input.starts_with('<') && input.ends_with('>') {
                format!("#include {input}")
            } else {
                prerequisites.extend(self.headers.resolve(input));
                format!("#include \"{input}\"")
            };
            commands.push(Command::Literal(format!("echo >>$@ {}", shell_word(&line))));
        }
        state.fragment.rules.insert(out.clone(), Rule { prerequisites, commands });
        state.fragment.outs.insert(out.clone());

        let pch = format!("{out}{PCH_EXT}");
        let base = if lang == Language::CHeader { Language::C } else { Language::Cxx };
        let mut compile = state.compiler(base);
        compile.extend(["-o", "$@", "-x", lang.as_str(), "-c", out.as_str()].map(str::to_owned));
        debug!(project = %decl.name, target = %pch, "registering precompiled header");
        state
            .fragment
            .rules
            .insert(pch.clone(), Rule::new([out], vec![Command::Tokens(compile)]));
        state.fragment.outs.insert(pch.clone());
        pch
    }
}

/// Fold the language of one more input into the project language.
fn merge_language(
    decl: &ProjectDecl,
    explicit: Option<Language>,
    current: Option<Language>,
    incoming: Language,
    input: &str,
) -> Result<Language, ProjectError> {
    match (explicit, current) {
        (_, None) => Ok(incoming),
        (_, Some(existing)) if existing == incoming => Ok(existing),
        // An explicit C or C++ tag admits mixed sources; C++ wins.
        (Some(_), Some(_)) => Ok(Language::Cxx),
        (None, Some(existing)) => Err(ProjectError::LanguageConflict {
            project: decl.name.clone(),
            existing,
            incoming,
            input: input.to_owned(),
        }),
    }
}

/// Working state while a single project is translated.
struct ProjectState<'d> {
    decl: &'d ProjectDecl,
    graph: &'d RuleGraph,
    cc: Vec<String>,
    cxx: Vec<String>,
    extdeps: Vec<String>,
    objects: BTreeSet<String>,
    fragment: ProjectFragment,
}

impl<'d> ProjectState<'d> {
    fn new(decl: &'d ProjectDecl, graph: &'d RuleGraph) -> Self {
        let flags = &decl.flags;
        let mut cc = vec!["$(CC)".to_owned(), "$(CPPFLAGS)".to_owned()];
        cc.extend(flags.preprocessor.iter().cloned());
        cc.push("$(CFLAGS)".to_owned());
        cc.extend(flags.compile_c.iter().cloned());

        let mut cxx = vec!["$(CXX)".to_owned(), "$(CPPFLAGS)".to_owned()];
        cxx.extend(flags.preprocessor.iter().cloned());
        cxx.push("$(CXXFLAGS)".to_owned());
        cxx.extend(flags.compile_cxx.iter().cloned());

        let mut extdeps = decl.extdeps.clone();
        if let Some(pch) = decl.precompiled.as_deref().filter(|p| !p.is_empty()) {
            let header = format!("{}{pch}", decl.intdir());
            extdeps.push(format!("{header}{PCH_EXT}"));
            cxx.push("-include".to_owned());
            cxx.push(header);
        }

        Self {
            decl,
            graph,
            cc,
            cxx,
            extdeps,
            objects: BTreeSet::new(),
            fragment: ProjectFragment {
                name: decl.name.clone(),
                outs: decl.outs.iter().cloned().collect(),
                ..ProjectFragment::default()
            },
        }
    }

    fn compiler(&self, lang: Language) -> Vec<String> {
        match lang {
            Language::C | Language::CHeader => self.cc.clone(),
            Language::Cxx | Language::CxxHeader => self.cxx.clone(),
        }
    }

    fn link(&mut self, compiler: &[String], out: &str) {
        let mut prerequisites = self.objects.clone();
        prerequisites.extend(self.extdeps.iter().cloned());
        let mut command: Vec<String> = compiler
            .iter()
            .filter(|flag| !flag.starts_with("-std="))
            .cloned()
            .collect();
        command.extend(["-o".to_owned(), "$@".to_owned()]);
        command.extend(self.objects.iter().cloned());
        command.extend(self.decl.flags.link.iter().cloned());
        debug!(target = %out, objects = self.objects.len(), "registering link rule");
        self.fragment.rules.insert(
            out.to_owned(),
            Rule {
                prerequisites,
                commands: vec![ensure_dir(), Command::Tokens(command)],
            },
        );
        self.fragment.outs.insert(out.to_owned());
        self.fragment.outs.extend(self.objects.iter().cloned());
    }

    /// Attach the alias and the caller's hooks, then hand back the fragment.
    fn finish(mut self, out: String) -> ProjectFragment {
        let decl = self.decl;
        if let Some(rule) = self.fragment.rules.get_mut(&out) {
            rule.commands.extend(decl.postbuild.iter().cloned());
        }
        let entry = if out == decl.name || decl.name == decl.outname() {
            out.clone()
        } else {
            decl.name.clone()
        };
        if entry != out {
            self.fragment.rules.insert(entry.clone(), Rule::new([out], Vec::new()));
            self.fragment.phonys.insert(entry.clone());
        }
        if let Some(rule) = self.fragment.rules.get_mut(&entry) {
            rule.commands.extend(decl.postexec.iter().cloned());
        }
        self.fragment.entry = entry;
        self.fragment
    }
}

fn ensure_dir() -> Command {
    Command::tokens(["mkdir", "-p", "`dirname $@`"])
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Command;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct Sandbox {
        _dir: TempDir,
        headers: HeaderResolver,
    }

    #[fixture]
    fn sandbox() -> Sandbox {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = camino::Utf8Path::from_path(dir.path()).expect("utf8 tempdir");
        std::fs::write(root.join("util.h"), "int util(void);\n").expect("write util.h");
        std::fs::write(root.join("main.cpp"), "#include \"util.h\"\nint main() {}\n")
            .expect("write main.cpp");
        let headers = HeaderResolver::new(root);
        Sandbox { _dir: dir, headers }
    }

    fn build(sandbox: &Sandbox, decl: &ProjectDecl) -> Result<ProjectFragment, ProjectError> {
        ProjectBuilder::new(&sandbox.headers).build(decl, &RuleGraph::default())
    }

    fn rendered(rule: &Rule) -> Vec<String> {
        rule.commands.iter().map(Command::render).collect()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[rstest]
    fn single_source_program_has_compile_and_link_rules(sandbox: Sandbox) {
        let fragment = build(&sandbox, &ProjectDecl::new("app", ["main.cpp"])).expect("build");
        assert_eq!(fragment.rules.len(), 2);
        assert_eq!(fragment.entry, "$(OUTDIR)app");
        assert!(fragment.phonys.is_empty());

        let object = &fragment.rules["$(INTDIR)main.cpp.o"];
        assert_eq!(object.prerequisites, set(&["main.cpp", "util.h"]));
        assert_eq!(
            rendered(object),
            [
                "mkdir -p `dirname $@`",
                "$(CXX) $(CPPFLAGS) $(CXXFLAGS) -o $@ -c main.cpp",
            ]
        );

        let link = &fragment.rules["$(OUTDIR)app"];
        assert_eq!(link.prerequisites, set(&["$(INTDIR)main.cpp.o"]));
        assert_eq!(
            rendered(link),
            [
                "mkdir -p `dirname $@`",
                "$(CXX) $(CPPFLAGS) $(CXXFLAGS) -o $@ $(INTDIR)main.cpp.o",
            ]
        );
        assert_eq!(fragment.outs, set(&["$(INTDIR)main.cpp.o", "$(OUTDIR)app"]));
    }

    #[rstest]
    fn missing_source_still_depends_on_itself() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = camino::Utf8Path::from_path(dir.path()).expect("utf8 tempdir");
        let headers = HeaderResolver::new(root);
        let fragment = ProjectBuilder::new(&headers)
            .build(&ProjectDecl::new("app", ["main.cpp"]), &RuleGraph::default())
            .expect("build");
        assert_eq!(fragment.rules["$(INTDIR)main.cpp.o"].prerequisites, set(&["main.cpp"]));
    }

    #[rstest]
    fn distinct_outname_adds_phony_alias(sandbox: Sandbox) {
        let decl = ProjectDecl {
            outname: Some("program".into()),
            ..ProjectDecl::new("app", ["main.cpp"])
        };
        let fragment = build(&sandbox, &decl).expect("build");
        let alias = &fragment.rules["app"];
        assert_eq!(alias.prerequisites, set(&["$(OUTDIR)program"]));
        assert!(alias.commands.is_empty());
        assert_eq!(fragment.phonys, set(&["app"]));
        assert_eq!(fragment.entry, "app");
        assert!(!fragment.outs.contains("app"));
    }

    #[rstest]
    fn mixing_languages_without_tag_is_rejected(sandbox: Sandbox) {
        let err = build(&sandbox, &ProjectDecl::new("mix", ["a.c", "b.cpp"])).expect_err("conflict");
        assert_eq!(
            err,
            ProjectError::LanguageConflict {
                project: "mix".into(),
                existing: Language::C,
                incoming: Language::Cxx,
                input: "b.cpp".into(),
            }
        );
    }

    #[rstest]
    #[case(Some("c"))]
    #[case(Some("c++"))]
    fn explicit_tag_admits_mixed_sources(sandbox: Sandbox, #[case] lang: Option<&str>) {
        let decl = ProjectDecl {
            lang: lang.map(str::to_owned),
            ..ProjectDecl::new("mix", ["a.c", "b.cpp"])
        };
        let fragment = build(&sandbox, &decl).expect("build");
        let c_object = rendered(&fragment.rules["$(INTDIR)a.c.o"]);
        assert!(c_object[1].starts_with("$(CC) "), "C sources use CC: {c_object:?}");
        let link = rendered(&fragment.rules["$(OUTDIR)mix"]);
        assert!(link[1].starts_with("$(CXX) "), "mixed projects link as C++: {link:?}");
    }

    #[rstest]
    #[case("notes.txt", ".txt")]
    #[case("Makefile", "")]
    fn unknown_extension_is_rejected(sandbox: Sandbox, #[case] input: &str, #[case] ext: &str) {
        let err = build(&sandbox, &ProjectDecl::new("bad", ["main.cpp", input])).expect_err("input");
        assert_eq!(
            err,
            ProjectError::UnsupportedInputType {
                project: "bad".into(),
                input: input.into(),
                extension: ext.into(),
            }
        );
    }

    #[rstest]
    fn unknown_language_tag_is_rejected(sandbox: Sandbox) {
        let decl = ProjectDecl {
            lang: Some("fortran".into()),
            ..ProjectDecl::new("legacy", ["main.cpp"])
        };
        let err = build(&sandbox, &decl).expect_err("language");
        assert_eq!(
            err,
            ProjectError::UnsupportedLanguage {
                project: "legacy".into(),
                language: "fortran".into(),
            }
        );
    }

    #[rstest]
    fn project_without_inputs_is_a_phony_target(sandbox: Sandbox) {
        let decl = ProjectDecl {
            postbuild: vec![Command::Literal("@echo built".into())],
            ..ProjectDecl::new("docs", Vec::<String>::new())
        };
        let fragment = build(&sandbox, &decl).expect("build");
        assert_eq!(fragment.entry, "docs");
        assert_eq!(fragment.phonys, set(&["docs"]));
        assert_eq!(fragment.rules.keys().collect::<Vec<_>>(), ["docs"]);
        assert_eq!(rendered(&fragment.rules["docs"]), ["@echo built"]);
        assert!(fragment.outs.is_empty());
    }

    #[rstest]
    fn custom_project_ignores_outname(sandbox: Sandbox) {
        let decl = ProjectDecl {
            outname: Some("manual".into()),
            postexec: vec![Command::tokens(["echo", "docs"])],
            ..ProjectDecl::new("docs", Vec::<String>::new())
        };
        let fragment = build(&sandbox, &decl).expect("build");
        assert_eq!(fragment.entry, "docs");
        assert_eq!(fragment.rules.len(), 1);
        assert_eq!(rendered(&fragment.rules["docs"]), ["echo docs"]);
    }

    #[rstest]
    fn hooks_attach_to_output_and_alias(sandbox: Sandbox) {
        let decl = ProjectDecl {
            outname: Some("app.bin".into()),
            postbuild: vec![Command::tokens(["strip", "$@"])],
            postexec: vec![Command::tokens(["./$(OUTDIR)app.bin", "--selftest"])],
            ..ProjectDecl::new("app", ["main.cpp"])
        };
        let fragment = build(&sandbox, &decl).expect("build");
        let link = rendered(&fragment.rules["$(OUTDIR)app.bin"]);
        assert_eq!(link.last().map(String::as_str), Some("strip $@"));
        assert_eq!(rendered(&fragment.rules["app"]), ["./$(OUTDIR)app.bin --selftest"]);
    }

    #[rstest]
    fn link_orders_objects_and_strips_dialect(sandbox: Sandbox) {
        let mut decl = ProjectDecl::new("tool", ["z.c", "a.c"]);
        decl.flags.compile_c = vec!["-std=c99".into(), "-O2".into()];
        decl.flags.link = vec!["-lm".into()];
        decl.extdeps = vec!["libfoo.a".into()];
        let fragment = build(&sandbox, &decl).expect("build");

        let compile = rendered(&fragment.rules["$(INTDIR)z.c.o"]);
        assert_eq!(compile[1], "$(CC) $(CPPFLAGS) $(CFLAGS) -std=c99 -O2 -o $@ -c z.c");
        assert!(fragment.rules["$(INTDIR)z.c.o"].prerequisites.contains("libfoo.a"));

        let link = &fragment.rules["$(OUTDIR)tool"];
        assert_eq!(
            rendered(link)[1],
            "$(CC) $(CPPFLAGS) $(CFLAGS) -O2 -o $@ $(INTDIR)a.c.o $(INTDIR)z.c.o -lm"
        );
        assert_eq!(
            link.prerequisites,
            set(&["$(INTDIR)a.c.o", "$(INTDIR)z.c.o", "libfoo.a"])
        );
    }

    #[rstest]
    fn intermediate_known_to_graph_is_not_registered_again(sandbox: Sandbox) {
        let mut graph = RuleGraph::default();
        graph.rules.insert(
            "$(INTDIR)main.cpp.o".into(),
            Rule::new(["main.cpp"], vec![Command::Literal("prebuilt".into())]),
        );
        let fragment = ProjectBuilder::new(&sandbox.headers)
            .build(&ProjectDecl::new("second", ["main.cpp"]), &graph)
            .expect("build");
        assert!(!fragment.rules.contains_key("$(INTDIR)main.cpp.o"));
        assert!(fragment.outs.contains("$(INTDIR)main.cpp.o"));
        assert!(fragment.rules["$(OUTDIR)second"]
            .prerequisites
            .contains("$(INTDIR)main.cpp.o"));
    }

    #[rstest]
    fn precompiled_header_project_writes_aggregate_and_pch(sandbox: Sandbox) {
        let decl = ProjectDecl {
            lang: Some("c++-header".into()),
            intdir: Some("obj/".into()),
            outdir: Some("obj/".into()),
            ..ProjectDecl::new("stdafx.h", ["util.h", "<vector>"])
        };
        let fragment = build(&sandbox, &decl).expect("build");

        let aggregate = &fragment.rules["obj/stdafx.h"];
        assert_eq!(aggregate.prerequisites, set(&["util.h"]));
        let lines = rendered(aggregate);
        assert_eq!(lines[..2], ["mkdir -p `dirname $@`", "rm -f $@"]);
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("echo >>$@ ") && lines[2].contains("util.h"));
        assert!(lines[3].contains("<vector>"));

        let pch = &fragment.rules["obj/stdafx.h$(PCHEXT)"];
        assert_eq!(pch.prerequisites, set(&["obj/stdafx.h"]));
        assert_eq!(
            rendered(pch),
            ["$(CXX) $(CPPFLAGS) $(CXXFLAGS) -o $@ -x c++-header -c obj/stdafx.h"]
        );
        assert_eq!(fragment.entry, "obj/stdafx.h$(PCHEXT)");
        assert_eq!(fragment.outs, set(&["obj/stdafx.h", "obj/stdafx.h$(PCHEXT)"]));
    }

    #[rstest]
    fn consumer_force_includes_precompiled_header(sandbox: Sandbox) {
        let decl = ProjectDecl {
            precompiled: Some("stdafx.h".into()),
            ..ProjectDecl::new("app", ["main.cpp"])
        };
        let fragment = build(&sandbox, &decl).expect("build");
        let object = &fragment.rules["$(INTDIR)main.cpp.o"];
        assert!(object.prerequisites.contains("$(INTDIR)stdafx.h$(PCHEXT)"));
        assert_eq!(
            rendered(object)[1],
            "$(CXX) $(CPPFLAGS) $(CXXFLAGS) -include $(INTDIR)stdafx.h -o $@ -c main.cpp"
        );
    }
}
