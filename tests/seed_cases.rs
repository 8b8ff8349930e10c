//! End-to-end checks on small hand-built solutions

use approx::assert_relative_eq;
use magpost::{BlockIntegrand, LineIntegrand, LoadError, PostProcessor, MU0};
use std::path::PathBuf;

fn write_solution(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("magpost_{}_{}.ans", name, std::process::id()));
    std::fs::write(&path, content).unwrap();
    path
}

fn header(problem_type: &str, frequency: f64) -> String {
    format!(
        "[Format] =  4.0\n\
         [Frequency] =  {frequency}\n\
         [Precision] =  1e-008\n\
         [LengthUnits] =  meters\n\
         [Depth] =  1\n\
         [ProblemType] =  {problem_type}\n\
         [Coordinates] =  cartesian\n\
         [extZo] = 0\n\
         [extRo] = 0\n\
         [extRi] = 0\n"
    )
}

fn air_block(h_c: f64, sigma: f64) -> String {
    format!(
        "<BeginBlock>\n\
         <BlockName> = \"Test Material\"\n\
         <Mu_x> = 1\n\
         <Mu_y> = 1\n\
         <H_c> = {h_c}\n\
         <J_re> = 0\n\
         <Sigma> = {sigma}\n\
         <d_lam> = 0\n\
         <Phi_h> = 0\n\
         <LamFill> = 1\n\
         <LamType> = 0\n\
         <NStrands> = 0\n\
         <WireD> = 0\n\
         <BHPoints> = 0\n\
         <EndBlock>\n"
    )
}

/// One CCW unit triangle (0,0)-(1,0)-(0,1) with prescribed nodal A
fn single_triangle(name: &str, h_c: f64, a: [f64; 3]) -> PathBuf {
    let content = format!(
        "{}{}\
         [NumPoints] = 0\n\
         [NumSegments] = 0\n\
         [NumArcSegments] = 0\n\
         [NumHoles] = 0\n\
         [NumBlockLabels] = 1\n\
         0.25\t0.25\t1\t-1\t0\t0\t0\t1\t0\n\
         [Solution]\n\
         3\n\
         0\t0\t{}\n\
         1\t0\t{}\n\
         0\t1\t{}\n\
         1\n\
         0\t1\t2\t0\n\
         0\n\
         0\n\
         0\n",
        header("planar", 0.0),
        air_block(h_c, 0.0),
        a[0],
        a[1],
        a[2]
    );
    write_solution(name, &content)
}

/// Unit square split into two triangles with A = y, one block label
fn unit_square(name: &str, circuit: &str, turns: i32) -> PathBuf {
    let content = format!(
        "{}{}{}\
         [NumPoints] = 4\n\
         0\t0\t0\n\
         1\t0\t0\n\
         1\t1\t0\n\
         0\t1\t0\n\
         [NumSegments] = 0\n\
         [NumArcSegments] = 0\n\
         [NumHoles] = 0\n\
         [NumBlockLabels] = 1\n\
         0.5\t0.4\t1\t-1\t{}\t0\t0\t{}\t0\n\
         [Solution]\n\
         4\n\
         0\t0\t0\n\
         1\t0\t0\n\
         1\t1\t1\n\
         0\t1\t1\n\
         2\n\
         0\t1\t2\t0\n\
         0\t2\t3\t0\n\
         1\n\
         1\t0\n\
         0\n\
         0\n",
        header("planar", 0.0),
        air_block(0.0, 0.0),
        circuit,
        if circuit.is_empty() { 0 } else { 1 },
        turns
    );
    write_solution(name, &content)
}

#[test]
fn test_single_triangle_field() {
    // A = 1 - x - y gives B = (-1, 1) and |B| = sqrt(2)
    let path = single_triangle("tri", 0.0, [1.0, 0.0, 0.0]);
    let mut proc = PostProcessor::new();
    proc.open(&path).unwrap();

    assert_eq!(proc.num_nodes(), 3);
    assert_eq!(proc.num_elements(), 1);

    let u = proc.point_values(0.25, 0.25).unwrap();
    assert_relative_eq!(u.b1.re, -1.0, max_relative = 1e-12);
    assert_relative_eq!(u.b2.re, 1.0, max_relative = 1e-12);
    assert_relative_eq!(u.h1.re, -1.0 / MU0, max_relative = 1e-12);
    assert_relative_eq!(u.h2.re, 1.0 / MU0, max_relative = 1e-12);
    // linear material: w = |B|^2 / (2 mu0)
    assert_relative_eq!(u.e, 1.0 / MU0, max_relative = 1e-12);
    assert_relative_eq!(u.a.re, 0.5, max_relative = 1e-12);

    // outside the mesh there is no answer
    assert!(proc.point_values(2.0, 2.0).is_none());
    assert!(proc.in_triangle(0.1, 0.1).is_some());

    proc.select_group(0);
    let area = proc.block_integral(BlockIntegrand::CrossSectionArea);
    assert_relative_eq!(area.re, 0.5, max_relative = 1e-12);
    let vol = proc.block_integral(BlockIntegrand::Volume);
    assert_relative_eq!(vol.re, 0.5, max_relative = 1e-12);
    let energy = proc.block_integral(BlockIntegrand::MagneticEnergy);
    assert_relative_eq!(energy.re, 0.5 / MU0, max_relative = 1e-12);

    // no magnetization in a mu_r = 1 region without coercivity
    let (m1, m2) = proc.magnetization(0);
    assert!(m1.norm() < 1e-9 && m2.norm() < 1e-9);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_unit_square_flux_lines() {
    let path = unit_square("square", "", 1);
    let mut proc = PostProcessor::new();
    proc.open(&path).unwrap();

    assert_eq!(proc.num_elements(), 2);

    // element search lands on the right triangle for each centroid
    assert_eq!(proc.in_triangle(2.0 / 3.0, 1.0 / 3.0), Some(0));
    assert_eq!(proc.in_triangle(1.0 / 3.0, 2.0 / 3.0), Some(1));
    assert_eq!(proc.closest_node(0.1, 0.1), Some(0));

    // flux along the bottom edge: A is equal at both ends
    proc.add_contour_point(0.0, 0.0);
    proc.add_contour_point(1.0, 0.0);
    let z = proc.line_integral(LineIntegrand::NormalFlux);
    assert!(z[0].norm() < 1e-12, "expected zero flux, got {:?}", z[0]);

    // flux along the left edge: A drops from 0 to 1
    proc.clear_contour();
    proc.add_contour_point(0.0, 0.0);
    proc.add_contour_point(0.0, 1.0);
    let z = proc.line_integral(LineIntegrand::NormalFlux);
    assert_relative_eq!(z[0].re, -1.0, max_relative = 1e-12);

    // H.t along the bottom edge: B = (1, 0) everywhere, so the MMF drop
    // is |B| / mu0 times the length
    proc.clear_contour();
    proc.add_contour_point(0.0, 0.0);
    proc.add_contour_point(1.0, 0.0);
    let z = proc.line_integral(LineIntegrand::TangentialH);
    assert_relative_eq!(z[0].re, 1.0 / MU0, max_relative = 1e-6);
    assert_relative_eq!(z[1].re, 1.0 / MU0, max_relative = 1e-6);

    // contour length and swept area
    let z = proc.line_integral(LineIntegrand::Length);
    assert_relative_eq!(z[0].re, 1.0, max_relative = 1e-12);
    assert_relative_eq!(z[0].im, 1.0, max_relative = 1e-12);

    // Maxwell tension across a horizontal cut: B parallel to the cut
    // pulls with -B^2/(2 mu0) per unit area
    proc.clear_contour();
    proc.add_contour_point(0.1, 0.5);
    proc.add_contour_point(0.9, 0.5);
    let z = proc.line_integral(LineIntegrand::StressForce);
    assert!(z[0].norm() < 1e-9);
    assert_relative_eq!(z[1].re, -0.8 / (2.0 * MU0), max_relative = 1e-6);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_block_integral_area_linearity() {
    // total cross-section equals the sum of the triangle areas
    let path = unit_square("area", "", 1);
    let mut proc = PostProcessor::new();
    proc.open(&path).unwrap();

    proc.select_group(0);
    let area = proc.block_integral(BlockIntegrand::CrossSectionArea);
    assert_relative_eq!(area.re, 1.0, max_relative = 1e-12);

    // centroid of the square
    let c = proc.block_integral(BlockIntegrand::Centroid);
    assert_relative_eq!(c.re, 0.5, max_relative = 1e-12);
    assert_relative_eq!(c.im, 0.5, max_relative = 1e-12);

    // clearing the selection empties the integral
    proc.clear_selection();
    assert_eq!(proc.num_selected_blocks(), 0);
    let area = proc.block_integral(BlockIntegrand::CrossSectionArea);
    assert!(area.norm() < 1e-15);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_linear_pm_stored_energy() {
    // uniformly magnetized block with A = 0 everywhere: B = 0, H = -H_c,
    // and the stored energy density is mu0 H_c^2 / 2
    let h_c = 1000.0;
    let path = single_triangle("pm", h_c, [0.0, 0.0, 0.0]);
    let mut proc = PostProcessor::new();
    proc.open(&path).unwrap();

    let u = proc.point_values(0.25, 0.25).unwrap();
    assert_relative_eq!(u.h1.re, -h_c, max_relative = 1e-12);
    assert!(u.h2.norm() < 1e-9);
    assert_relative_eq!(u.e, 0.5 * MU0 * h_c * h_c, max_relative = 1e-12);

    proc.select_group(0);
    let energy = proc.block_integral(BlockIntegrand::MagneticEnergy);
    assert_relative_eq!(energy.re, 0.25 * MU0 * h_c * h_c, max_relative = 1e-12);

    // the magnetization reports the coercivity
    let (m1, m2) = proc.magnetization(0);
    assert_relative_eq!(m1.re, h_c, max_relative = 1e-12);
    assert!(m2.norm() < 1e-9);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_zero_current_parallel_linkage() {
    // parallel circuit, zero current, zero frequency, zero conductivity:
    // the linkage falls back to the uniform-current-density average of A
    let circuit = "<BeginCircuit>\n\
                   <CircuitName> = \"coil\"\n\
                   <TotalAmps_re> = 0\n\
                   <TotalAmps_im> = 0\n\
                   <CircuitType> = 0\n\
                   <EndCircuit>\n";
    let path = unit_square("parlink", circuit, 1);
    let mut proc = PostProcessor::new();
    proc.open(&path).unwrap();

    assert_eq!(proc.num_circuits(), 1);
    let lambda = proc.flux_linkage(0);
    // mean of A = y over the unit square
    assert_relative_eq!(lambda.re, 0.5, max_relative = 1e-12);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_zero_current_series_stranded_linkage() {
    // series circuit with a 10-turn stranded block: linkage is
    // turns times the average A
    let circuit = "<BeginCircuit>\n\
                   <CircuitName> = \"coil\"\n\
                   <TotalAmps_re> = 0\n\
                   <TotalAmps_im> = 0\n\
                   <CircuitType> = 1\n\
                   <EndCircuit>\n";
    let path = unit_square("serlink", circuit, 10);
    let mut proc = PostProcessor::new();
    proc.open(&path).unwrap();

    let lambda = proc.flux_linkage(0);
    assert_relative_eq!(lambda.re, 5.0, max_relative = 1e-12);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_axisymmetric_uniform_bz() {
    // stored potential 2*pi*r*A_phi = pi*r^2 represents a uniform
    // B_z = 1 T; the quadratic reconstruction recovers it exactly
    let pi = std::f64::consts::PI;
    let content = format!(
        "{}{}\
         [NumPoints] = 0\n\
         [NumSegments] = 0\n\
         [NumArcSegments] = 0\n\
         [NumHoles] = 0\n\
         [NumBlockLabels] = 1\n\
         1.3\t0.3\t1\t-1\t0\t0\t0\t1\t0\n\
         [Solution]\n\
         3\n\
         1\t0\t{}\n\
         2\t0\t{}\n\
         1\t1\t{}\n\
         1\n\
         0\t1\t2\t0\n\
         0\n\
         0\n\
         0\n",
        header("axisymmetric", 0.0),
        air_block(0.0, 0.0),
        pi,
        4.0 * pi,
        pi
    );
    let path = write_solution("axi", &content);
    let mut proc = PostProcessor::new();
    proc.open(&path).unwrap();

    let u = proc.point_values(1.3, 0.3).unwrap();
    assert!(u.b1.norm() < 1e-9, "B_r should vanish, got {:?}", u.b1);
    assert_relative_eq!(u.b2.re, 1.0, max_relative = 1e-9);
    // the potential is the total flux pi*r^2 through radius r
    assert_relative_eq!(u.a.re, pi * 1.3 * 1.3, max_relative = 1e-9);

    // element volume: area times the swept ring at the mean radius
    assert_relative_eq!(proc.elm_volume(0), 0.5 * 2.0 * pi * (4.0 / 3.0), max_relative = 1e-12);
    proc.select_group(0);
    let vol = proc.block_integral(BlockIntegrand::Volume);
    assert_relative_eq!(vol.re, 0.5 * 2.0 * pi * (4.0 / 3.0), max_relative = 1e-12);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_bend_contour_endpoints() {
    let path = single_triangle("bend", 0.0, [0.0, 0.0, 0.0]);
    let mut proc = PostProcessor::new();
    proc.open(&path).unwrap();

    proc.add_contour_point(0.0, 0.0);
    proc.add_contour_point(1.0, 0.0);
    proc.bend_contour(90.0, 10.0);

    // one original point plus nine arc pieces
    assert_eq!(proc.contour().len(), 10);
    let last = proc.contour()[9];
    assert_relative_eq!(last.re, 1.0, epsilon = 1e-12);
    assert_relative_eq!(last.im, 0.0, epsilon = 1e-12);

    // bending by more than 180 degrees is refused
    proc.bend_contour(270.0, 10.0);
    assert_eq!(proc.contour().len(), 10);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_rejects_bad_files() {
    // wrong format version
    let content = header("planar", 0.0).replace("4.0", "3.0");
    let path = write_solution("badfmt", &content);
    let mut proc = PostProcessor::with_warning_sink(Box::new(|_| {}));
    match proc.open(&path) {
        Err(LoadError::UnsupportedFormat { .. }) => {}
        other => panic!("expected UnsupportedFormat, got {:?}", other.err()),
    }
    std::fs::remove_file(path).ok();

    // no [Solution] marker at all
    let content = format!("{}{}", header("planar", 0.0), air_block(0.0, 0.0));
    let path = write_solution("nosol", &content);
    let mut proc = PostProcessor::with_warning_sink(Box::new(|_| {}));
    match proc.open(&path) {
        Err(LoadError::NoSolution) => {}
        other => panic!("expected NoSolution, got {:?}", other.err()),
    }
    std::fs::remove_file(path).ok();

    // nonexistent file
    let mut proc = PostProcessor::with_warning_sink(Box::new(|_| {}));
    assert!(matches!(
        proc.open("/nonexistent/magpost.ans"),
        Err(LoadError::Io(_))
    ));
}

/// Unit-square mesh with A = y and a configurable material block
fn unit_square_with_block(name: &str, freq: f64, block: &str) -> PathBuf {
    let im = if freq != 0.0 { "\t0" } else { "" };
    let content = format!(
        "{}{}\
         [NumPoints] = 0\n\
         [NumSegments] = 0\n\
         [NumArcSegments] = 0\n\
         [NumHoles] = 0\n\
         [NumBlockLabels] = 1\n\
         0.5\t0.4\t1\t-1\t0\t0\t0\t1\t0\n\
         [Solution]\n\
         4\n\
         0\t0\t0{im}\n\
         1\t0\t0{im}\n\
         1\t1\t1{im}\n\
         0\t1\t1{im}\n\
         2\n\
         0\t1\t2\t0\n\
         0\t2\t3\t0\n\
         0\n\
         0\n\
         0\n",
        header("planar", freq),
        block
    );
    write_solution(name, &content)
}

#[test]
fn test_lorentz_force_on_current_block() {
    // J = 1 MA/m^2 out of plane in B = (1, 0) T: F = J x B = 1e6 N/m^3
    // in +y over one cubic meter
    let block = "<BeginBlock>\n\
                 <BlockName> = \"Coil\"\n\
                 <Mu_x> = 1\n\
                 <Mu_y> = 1\n\
                 <H_c> = 0\n\
                 <J_re> = 1\n\
                 <Sigma> = 0\n\
                 <d_lam> = 0\n\
                 <LamFill> = 1\n\
                 <LamType> = 0\n\
                 <BHPoints> = 0\n\
                 <EndBlock>\n";
    let path = unit_square_with_block("lorentz", 0.0, block);
    let mut proc = PostProcessor::new();
    proc.open(&path).unwrap();
    proc.select_group(0);

    let amps = proc.block_integral(BlockIntegrand::TotalCurrent);
    assert_relative_eq!(amps.re, 1.0e6, max_relative = 1e-12);

    let fy = proc.block_integral(BlockIntegrand::LorentzForceYSteady);
    assert_relative_eq!(fy.re, 1.0e6, max_relative = 1e-12);
    let fx = proc.block_integral(BlockIntegrand::LorentzForceXSteady);
    assert!(fx.norm() < 1e-6);

    // integral of A.J* with A = y
    let aj = proc.block_integral(BlockIntegrand::PotentialCurrent);
    assert_relative_eq!(aj.re, 0.5e6, max_relative = 1e-12);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_nonlinear_bh_material_from_file() {
    // two-point B-H table equivalent to mu_r = 1000
    let h_at_2t = 2.0 / (1000.0 * MU0);
    let block = format!(
        "<BeginBlock>\n\
         <BlockName> = \"Soft Iron\"\n\
         <Mu_x> = 1000\n\
         <Mu_y> = 1000\n\
         <H_c> = 0\n\
         <J_re> = 0\n\
         <Sigma> = 0\n\
         <d_lam> = 0\n\
         <LamFill> = 1\n\
         <LamType> = 0\n\
         <BHPoints> = 2\n\
         0\t0\n\
         2\t{h_at_2t}\n\
         <EndBlock>\n"
    );
    let path = unit_square_with_block("bhfile", 0.0, &block);
    let mut proc = PostProcessor::new();
    proc.open(&path).unwrap();

    // |B| = 1 everywhere; the table interpolates back to mu_r = 1000
    let u = proc.point_values(0.5, 0.25).unwrap();
    assert_relative_eq!(u.mu1.re, 1000.0, max_relative = 1e-9);
    assert_relative_eq!(u.h1.re, 1.0 / (1000.0 * MU0), max_relative = 1e-9);
    // nonlinear energy density: int H dB = B^2/(2 mu mu0) on a linear table
    assert_relative_eq!(u.e, 1.0 / (2000.0 * MU0), max_relative = 1e-9);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_time_harmonic_energy_and_losses() {
    // AC problem, B = (1, 0) peak, mu_r = 1, sigma = 0: time-average
    // energy density |B|^2/(4 mu0), no hysteresis or eddy losses
    let block = "<BeginBlock>\n\
                 <BlockName> = \"Air\"\n\
                 <Mu_x> = 1\n\
                 <Mu_y> = 1\n\
                 <H_c> = 0\n\
                 <J_re> = 0\n\
                 <Sigma> = 0\n\
                 <d_lam> = 0\n\
                 <LamFill> = 1\n\
                 <LamType> = 0\n\
                 <BHPoints> = 0\n\
                 <EndBlock>\n";
    let path = unit_square_with_block("harmonic", 50.0, block);
    let mut proc = PostProcessor::new();
    proc.open(&path).unwrap();

    assert_relative_eq!(proc.frequency(), 50.0);
    let u = proc.point_values(0.5, 0.25).unwrap();
    assert_relative_eq!(u.b1.re, 1.0, max_relative = 1e-12);
    assert_relative_eq!(u.e, 1.0 / (4.0 * MU0), max_relative = 1e-12);
    assert!(u.ph.abs() < 1e-9);
    assert!(u.pe.abs() < 1e-9);
    assert!(u.je.norm() < 1e-12);

    proc.select_group(0);
    let energy = proc.block_integral(BlockIntegrand::MagneticEnergy);
    assert_relative_eq!(energy.re, 1.0 / (4.0 * MU0), max_relative = 1e-12);
    let losses = proc.block_integral(BlockIntegrand::TotalLosses);
    assert!(losses.norm() < 1e-9);

    std::fs::remove_file(path).ok();
}
