//! Generating C++ headers that embed resolved shader sources as byte arrays.
use std::path::{Path, PathBuf};

use indoc::formatdoc;
use log::{debug, info};

use crate::{error::BuildHeaderError, resolve::ShaderSections, BuildOptions};

/// The default suffix appended to the input path for the generated header.
pub const OUTPUT_SUFFIX: &str = ".gen.h";

const SOURCE_EXTENSION: &str = ".glsl";
const INCLUDE_GUARD_SUFFIX: &str = "_RD";
const CLASS_SUFFIX: &str = "ShaderRD";

/// Encode lines as comma separated character codes terminated by `0`.
///
/// A newline code follows every line when `insert_newline` is set,
/// so decoding the array reproduces the original text.
pub fn inline_code<S: AsRef<str>>(lines: &[S], insert_newline: bool) -> String {
    let mut output = Vec::new();
    for line in lines {
        let line = line.as_ref();
        if !line.is_empty() {
            let codes: Vec<_> = line.chars().map(|c| u32::from(c).to_string()).collect();
            output.push(codes.join(","));
        }
        if insert_newline {
            output.push(u32::from('\n').to_string());
        }
    }
    output.push("0".to_string());
    output.join(",")
}

/// The file name after the last `/` or `\`.
pub fn base_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// The preprocessor guard for a header like `A_GLSL_GEN_H_RD` for `a.glsl.gen.h`.
pub fn include_guard(file_name: &str) -> String {
    let mut guard: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    guard.push_str(INCLUDE_GUARD_SUFFIX);
    guard
}

/// The class name for a header like `ToneMappingShaderRD` for `tone_mapping.glsl.gen.h`.
pub fn class_name(file_name: &str, output_suffix: &str) -> String {
    let generated_suffix = format!("{SOURCE_EXTENSION}{output_suffix}");
    let name = file_name
        .strip_suffix(&generated_suffix)
        .unwrap_or(file_name);

    // Capitalize the first letter of each word and remove separators.
    let mut class = String::new();
    let mut previous_alphabetic = false;
    for c in name.chars() {
        if c.is_alphabetic() {
            if previous_alphabetic {
                class.extend(c.to_lowercase());
            } else {
                class.extend(c.to_uppercase());
            }
            previous_alphabetic = true;
        } else {
            if c.is_alphanumeric() {
                class.push(c);
            }
            previous_alphabetic = false;
        }
    }
    class.push_str(CLASS_SUFFIX);
    class
}

fn code_array(name: &str, lines: &[String], insert_newline: bool) -> String {
    format!(
        "static const char {name}[] = {{\n{}\n\t\t}};",
        inline_code(lines, insert_newline)
    )
}

/// The header text for the output file named `file_name`.
///
/// Compute shaders take precedence.
/// Vertex and fragment sources are not embedded if the compute section has any lines.
pub fn header_text(file_name: &str, sections: &ShaderSections, options: &BuildOptions) -> String {
    let ifdef = include_guard(file_name);
    let class = class_name(file_name, &options.output_suffix);

    let body_parts = if !sections.compute.is_empty() {
        if !sections.vertex.is_empty() || !sections.fragment.is_empty() {
            debug!("Skipping vertex and fragment sources for compute shader {file_name}");
        }
        vec![
            code_array(
                "_computeCode",
                &sections.compute.lines,
                options.insert_newline,
            ),
            format!("setup(nullptr, nullptr, _computeCode, \"{class}\");"),
        ]
    } else {
        vec![
            code_array("_vertexCode", &sections.vertex.lines, options.insert_newline),
            code_array(
                "_fragmentCode",
                &sections.fragment.lines,
                options.insert_newline,
            ),
            format!("setup(_vertexCode, _fragmentCode, nullptr, \"{class}\");"),
        ]
    };
    let body = body_parts.join("\n\t\t");

    formatdoc! {r#"
        /* WARNING, THIS FILE WAS GENERATED, DO NOT EDIT */
        #ifndef {ifdef}
        #define {ifdef}

        #include "shader_rd.h"

        class {class} : public ShaderRD {{
        public:
            {class}() {{
                {body}
            }}
        }};

        #endif
    "#}
}

/// The generated header path with the output suffix appended to `input`.
pub fn output_path(input: &Path, output_suffix: &str) -> PathBuf {
    let mut output = input.as_os_str().to_owned();
    output.push(output_suffix);
    PathBuf::from(output)
}

/// Write the header for the shader at `input` and return the output path.
pub fn write_header(
    input: &Path,
    sections: &ShaderSections,
    options: &BuildOptions,
) -> Result<PathBuf, BuildHeaderError> {
    if options.output_suffix.is_empty() {
        return Err(BuildHeaderError::EmptySuffix {
            input: input.to_owned(),
        });
    }

    let output = output_path(input, &options.output_suffix);
    let output_text = output.to_string_lossy();
    let text = header_text(base_name(&output_text), sections, options);

    std::fs::write(&output, text).map_err(|source| BuildHeaderError::Write {
        path: output.clone(),
        source,
    })?;
    info!("Wrote {output:?}");

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn sections(vertex: &[&str], fragment: &[&str], compute: &[&str]) -> ShaderSections {
        let mut sections = ShaderSections::default();
        sections.vertex.lines = vertex.iter().map(|l| l.to_string()).collect();
        sections.fragment.lines = fragment.iter().map(|l| l.to_string()).collect();
        sections.compute.lines = compute.iter().map(|l| l.to_string()).collect();
        sections
    }

    fn decode(code: &str) -> String {
        code.split(',')
            .map(|c| char::from_u32(c.parse().unwrap()).unwrap())
            .collect()
    }

    #[test]
    fn inline_code_lines() {
        assert_eq!("102,111,111,10,0", inline_code(&["foo"], true));
        assert_eq!("97,10,10,98,10,0", inline_code(&["a", "", "b"], true));
    }

    #[test]
    fn inline_code_empty() {
        assert_eq!("0", inline_code::<&str>(&[], true));
        assert_eq!("10,0", inline_code(&[""], true));
    }

    #[test]
    fn inline_code_no_newline() {
        assert_eq!("97,98,0", inline_code(&["a", "", "b"], false));
    }

    #[test]
    fn inline_code_decode() {
        let lines = [
            "#version 450",
            "",
            "layout(location = 0) out vec4 color;",
            "void main() { color = vec4(1.0); }",
            "\tfloat π = 3.14;",
        ];
        let decoded = decode(&inline_code(&lines, true));

        let mut expected = lines.join("\n");
        expected.push('\n');
        expected.push('\0');
        assert_eq!(expected, decoded);
    }

    #[test]
    fn base_name_separators() {
        assert_eq!("a.glsl.gen.h", base_name("a.glsl.gen.h"));
        assert_eq!("a.glsl.gen.h", base_name("shaders/effects/a.glsl.gen.h"));
        assert_eq!("a.glsl.gen.h", base_name("shaders\\a.glsl.gen.h"));
    }

    #[test]
    fn include_guard_file_names() {
        assert_eq!("A_GLSL_GEN_H_RD", include_guard("a.glsl.gen.h"));
        assert_eq!(
            "TONE_MAPPING_GLSL_GEN_H_RD",
            include_guard("tone-mapping.glsl.gen.h")
        );
    }

    #[test]
    fn class_name_file_names() {
        assert_eq!("AShaderRD", class_name("a.glsl.gen.h", OUTPUT_SUFFIX));
        assert_eq!(
            "ToneMappingShaderRD",
            class_name("tone_mapping.glsl.gen.h", OUTPUT_SUFFIX)
        );
        assert_eq!(
            "SsaoBlurShaderRD",
            class_name("SSAO_blur.glsl.gen.h", OUTPUT_SUFFIX)
        );
        assert_eq!(
            "Blur2XShaderRD",
            class_name("blur2x.glsl.gen.h", OUTPUT_SUFFIX)
        );
        assert_eq!(
            "SkyCompShaderRD",
            class_name("sky.comp.glsl.gen.h", OUTPUT_SUFFIX)
        );
        assert_eq!("SkyVertHShaderRD", class_name("sky.vert.h", OUTPUT_SUFFIX));
    }

    #[test]
    fn output_path_suffix() {
        assert_eq!(
            PathBuf::from("shaders/a.glsl.gen.h"),
            output_path(Path::new("shaders/a.glsl"), OUTPUT_SUFFIX)
        );
    }

    #[test]
    fn header_text_vertex_fragment() {
        let text = header_text(
            "a.glsl.gen.h",
            &sections(&["foo"], &["bar"], &[]),
            &BuildOptions::default(),
        );
        assert_eq!(
            indoc! {r#"
                /* WARNING, THIS FILE WAS GENERATED, DO NOT EDIT */
                #ifndef A_GLSL_GEN_H_RD
                #define A_GLSL_GEN_H_RD

                #include "shader_rd.h"

                class AShaderRD : public ShaderRD {
                public:
                    AShaderRD() {
                        static const char _vertexCode[] = {
                102,111,111,10,0
                		};
                		static const char _fragmentCode[] = {
                98,97,114,10,0
                		};
                		setup(_vertexCode, _fragmentCode, nullptr, "AShaderRD");
                    }
                };

                #endif
            "#},
            text
        );
    }

    #[test]
    fn header_text_empty_fragment() {
        let text = header_text(
            "a.glsl.gen.h",
            &sections(&["foo"], &[], &[]),
            &BuildOptions::default(),
        );
        assert!(text.contains("static const char _vertexCode[] = {\n102,111,111,10,0\n\t\t};"));
        assert!(text.contains("static const char _fragmentCode[] = {\n0\n\t\t};"));
        assert!(text.contains("setup(_vertexCode, _fragmentCode, nullptr, \"AShaderRD\");"));
    }

    #[test]
    fn header_text_compute_only() {
        let text = header_text(
            "sky.glsl.gen.h",
            &sections(&["foo"], &["bar"], &["baz"]),
            &BuildOptions::default(),
        );
        assert!(text.contains("static const char _computeCode[] = {\n98,97,122,10,0\n\t\t};"));
        assert!(text.contains("setup(nullptr, nullptr, _computeCode, \"SkyShaderRD\");"));
        assert!(!text.contains("_vertexCode"));
        assert!(!text.contains("_fragmentCode"));
    }
}
