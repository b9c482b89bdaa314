/*!

The minimal reference operator library — nothing elsewhere in the core assumes a closed set
of operators, but something has to exist to parse and test against: four expression
handlers covering constants, variable leaves, linear sums, and integer powers, plus one
nonlinear handler that always volunteers at the constraint root so every constraint gets
*some* enforcement even when no specialized structure is recognized.

A host embedding this core is free to register additional handlers (quadratic, bilinear,
exponential, trigonometric, …) alongside or instead of these; nothing elsewhere in the core
assumes this particular set.

*/

pub mod nlhdlr_default;
pub mod pow;
pub mod sum;
pub mod value;
pub mod var;
