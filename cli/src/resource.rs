use std::fmt;

use parcel::Bundle;

const BYTES_PER_LINE: usize = 12;

/// Rust source of a module embedding one [Bundle].
///
/// The module exposes `register(&mut parcel::Registry)`, which hands the
/// bundle to the registry.
pub struct Resource<'a> {
    bundle: &'a Bundle,
    module: &'a str,
    include_docs: bool,
}

impl<'a> Resource<'a> {
    pub fn new(bundle: &'a Bundle, module: &'a str) -> Self {
        Self {
            bundle,
            module,
            include_docs: true,
        }
    }

    pub fn include_docs(mut self, include_docs: bool) -> Self {
        self.include_docs = include_docs;
        self
    }
}

impl fmt::Display for Resource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.bundle.name;
        let length = self.bundle.length;

        if self.include_docs {
            writeln!(f, "// Auto-generated by parcel. DO NOT EDIT.")?;
            writeln!(f, "//")?;
            writeln!(
                f,
                "// Embeds the `{name}` bundle ({length} entries). Call `register` once at"
            )?;
            writeln!(
                f,
                "// program start to make its files available through the registry."
            )?;
            writeln!(f)?;
        }

        writeln!(f, "// module: {}", self.module)?;
        writeln!(f)?;

        writeln!(f, "static BODY: &[u8] = &[")?;
        for line in self.bundle.body.chunks(BYTES_PER_LINE) {
            write!(f, "   ")?;
            for byte in line {
                write!(f, " {byte:#04x},")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "];")?;
        writeln!(f)?;

        if self.include_docs {
            writeln!(f, "/// Adds the embedded `{name}` bundle to `registry`.")?;
        }
        writeln!(
            f,
            "pub fn register(registry: &mut parcel::Registry) -> Result<(), parcel::Error> {{"
        )?;
        writeln!(
            f,
            "    registry.add_resource(parcel::Bundle::new({name:?}, {length}, BODY))"
        )?;
        writeln!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;
    use parcel::Bundle;

    use super::Resource;

    fn bundle() -> Bundle {
        Bundle::new("demo", 2, (0u8..14).collect::<Vec<_>>())
    }

    #[test]
    fn with_docs() {
        let bundle = bundle();
        expect![[r#"
            // Auto-generated by parcel. DO NOT EDIT.
            //
            // Embeds the `demo` bundle (2 entries). Call `register` once at
            // program start to make its files available through the registry.

            // module: assets

            static BODY: &[u8] = &[
                0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b,
                0x0c, 0x0d,
            ];

            /// Adds the embedded `demo` bundle to `registry`.
            pub fn register(registry: &mut parcel::Registry) -> Result<(), parcel::Error> {
                registry.add_resource(parcel::Bundle::new("demo", 2, BODY))
            }
        "#]]
        .assert_eq(&Resource::new(&bundle, "assets").to_string());
    }

    #[test]
    fn without_docs() {
        let bundle = bundle();
        expect![[r#"
            // module: assets

            static BODY: &[u8] = &[
                0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b,
                0x0c, 0x0d,
            ];

            pub fn register(registry: &mut parcel::Registry) -> Result<(), parcel::Error> {
                registry.add_resource(parcel::Bundle::new("demo", 2, BODY))
            }
        "#]]
        .assert_eq(
            &Resource::new(&bundle, "assets")
                .include_docs(false)
                .to_string(),
        );
    }

    #[test]
    fn names_are_escaped() {
        let bundle = Bundle::new("say \"hi\"", 1, vec![0xff]);
        let source = Resource::new(&bundle, "m").to_string();
        assert!(source.contains(r#"parcel::Bundle::new("say \"hi\"", 1, BODY)"#));
        assert!(source.contains("    0xff,\n"));
    }
}
