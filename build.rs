/*

We generate the LALRPOP parser in the source tree so the IDE can index it; LALRPOP specs
and their generated code aren't otherwise understood by rust-analyzer's macro expansion.

*/

fn main() {
  lalrpop::Configuration::new()
      .generate_in_source_tree()
      .process().unwrap();
}
