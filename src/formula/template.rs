//! Homebrew formula rendering
//!
//! Pure text generation. The same data renders either the versioned formula
//! (`class DbtAT0152 < Formula`) or the default one (`class Dbt < Formula`);
//! only the class name differs.

use super::extract::FormulaData;

/// Which formula to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaKind {
  /// `Formula/dbt@M.N.P.rb`, class named after the version
  Versioned,
  /// `Formula/dbt.rb`, class named after the product alone
  Default,
}

/// Install and test stanzas shared by every formula
pub const FORMULA_TRAILER: &str = r##"
  def install
    venv = virtualenv_create(libexec, "python3")

    res = resources.map(&:name).to_set

    res.each do |r|
      venv.pip_install resource(r)
    end

    venv.pip_install_and_link buildpath

    bin.install_symlink "#{libexec}/bin/dbt" => "dbt"
  end

  test do
    (testpath/"dbt_project.yml").write("{name: 'test', version: '0.0.1', profile: 'default'}")
    (testpath/".dbt/profiles.yml").write(
      "{default: {outputs: {default: {type: 'postgres', threads: 1, host: 'localhost', port: 5432,
      user: 'root', pass: 'password', dbname: 'test', schema: 'test'}}, target: 'default'}}",
    )
    (testpath/"models/test.sql").write("select * from test")
    system "#{bin}/dbt", "test"
  end
"##;

/// Render a formula using `class_prefix` for the class name
pub fn render(data: &FormulaData, kind: FormulaKind, class_prefix: &str) -> String {
  let class_name = match kind {
    FormulaKind::Versioned => data.version.class_name_for(class_prefix),
    FormulaKind::Default => class_prefix.to_string(),
  };

  format!(
    r#"
class {class_name} < Formula
  include Language::Python::Virtualenv

  desc "Data build tool"
  homepage "https://github.com/fishtown-analytics/dbt"
  {url}
  {hash}
  version "{version}"
  revision 1

  depends_on "python3"
  depends_on "openssl"
  depends_on "postgresql"

  bottle do
    root_url "http://bottles.getdbt.com"
    # bottle hashes + versions go here
  end

  {dependencies}

  {trailer}
end
"#,
    class_name = class_name,
    url = data.url_line,
    hash = data.hash_line,
    version = data.version,
    dependencies = data.dependency_block,
    trailer = FORMULA_TRAILER,
  )
}
