mod helpers;

mod layout_tests;
mod object_tests;
mod reference_tests;
