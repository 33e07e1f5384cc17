extern crate nalgebra as na;

mod bvh2_properties;
mod bvh2_scenarios;
