use std::thread;

use crossbeam_channel::{bounded, Receiver};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::profile_store::{ConsolidatedDataset, ProfileStore};
use crate::types::PostureLabel;

/// Tamaño del bosque, igual que el modelo de referencia
pub const NUM_ARBOLES: usize = 100;

/// Semilla fija: mismo dataset ⇒ mismo modelo
pub const SEMILLA_ENTRENAMIENTO: u64 = 42;

/// Si la clase ganadora no alcanza esta proporción de votos, la
/// predicción se rebaja a `Aceptable` (zona de alerta)
pub const UMBRAL_ACEPTABLE: f32 = 0.6;

const PROFUNDIDAD_MAX: usize = 16;

/// Índice de clase → etiqueta. Los cubos de entrenamiento son binarios.
const CLASES: [PostureLabel; 2] = [PostureLabel::Perfecto, PostureLabel::Malo];

#[derive(Error, Debug)]
pub enum TrainError {
    #[error("no hay suficientes datos para entrenar: se necesitan muestras PERFECTO y MALO")]
    DatosInsuficientes,

    #[error(transparent)]
    Persistencia(#[from] anyhow::Error),
}

#[derive(Debug, Clone)]
pub struct TrainerParams {
    pub n_arboles: usize,
    pub semilla: u64,
    pub profundidad_max: usize,
}

impl Default for TrainerParams {
    fn default() -> Self {
        Self {
            n_arboles: NUM_ARBOLES,
            semilla: SEMILLA_ENTRENAMIENTO,
            profundidad_max: PROFUNDIDAD_MAX,
        }
    }
}

/// Árbol de decisión: divisiones binarias sobre una característica
enum Nodo {
    Hoja(PostureLabel),
    Rama {
        caracteristica: usize,
        umbral: f32,
        izquierda: Box<Nodo>,
        derecha: Box<Nodo>,
    },
}

impl Nodo {
    fn predecir(&self, caracteristicas: &[f32]) -> PostureLabel {
        match self {
            Nodo::Hoja(etiqueta) => *etiqueta,
            Nodo::Rama {
                caracteristica,
                umbral,
                izquierda,
                derecha,
            } => {
                if caracteristicas[*caracteristica] <= *umbral {
                    izquierda.predecir(caracteristicas)
                } else {
                    derecha.predecir(caracteristicas)
                }
            }
        }
    }
}

/// Clasificador ajustado de la sesión en curso. Vive solo en memoria:
/// se reconstruye desde cero en cada arranque y nunca se persiste.
pub struct PostureModel {
    arboles: Vec<Nodo>,
    precision_entrenamiento: f32,
}

impl PostureModel {
    /// Precisión por resustitución sobre el dataset de entrenamiento.
    /// Solo diagnóstico; ninguna decisión depende de ella.
    pub fn precision_entrenamiento(&self) -> f32 {
        self.precision_entrenamiento
    }

    /// Etiqueta más probable para un vector de características de
    /// `FEATURE_LEN` elementos. Una votación poco concluyente se rebaja
    /// a `Aceptable`.
    pub fn predecir(&self, caracteristicas: &[f32]) -> PostureLabel {
        let (ganadora, proporcion) = votar_bosque(&self.arboles, caracteristicas);
        if proporcion < UMBRAL_ACEPTABLE {
            PostureLabel::Aceptable
        } else {
            ganadora
        }
    }

    /// Etiqueta mayoritaria sin rebaja a Aceptable
    pub fn predecir_bruto(&self, caracteristicas: &[f32]) -> PostureLabel {
        votar_bosque(&self.arboles, caracteristicas).0
    }
}

/// Entrena el bosque con los parámetros por defecto (100 árboles,
/// semilla 42). Ver [`entrenar_con_params`].
pub fn entrenar(datos: &ConsolidatedDataset) -> Result<PostureModel, TrainError> {
    entrenar_con_params(datos, &TrainerParams::default())
}

/// Ajusta un bosque aleatorio sobre los dos cubos consolidados.
///
/// Cada muestra recibe la etiqueta de su cubo. Los pesos de clase
/// `n / (n_clases * n_clase)` compensan cubos de tamaño desigual para
/// que la clase mayoritaria no sesgue las predicciones. Devuelve
/// `DatosInsuficientes` si falta alguno de los dos cubos.
pub fn entrenar_con_params(
    datos: &ConsolidatedDataset,
    params: &TrainerParams,
) -> Result<PostureModel, TrainError> {
    if !datos.es_entrenable() {
        return Err(TrainError::DatosInsuficientes);
    }

    let n = datos.total_muestras();
    let mut x: Vec<&[f32]> = Vec::with_capacity(n);
    let mut y: Vec<usize> = Vec::with_capacity(n);
    for vector in &datos.perfecto {
        x.push(vector);
        y.push(0);
    }
    for vector in &datos.malo {
        x.push(vector);
        y.push(1);
    }

    let n_features = x[0].len();
    debug_assert!(x.iter().all(|v| v.len() == n_features));

    let pesos = [
        n as f32 / (2.0 * datos.perfecto.len() as f32),
        n as f32 / (2.0 * datos.malo.len() as f32),
    ];

    let mut rng = StdRng::seed_from_u64(params.semilla);
    let mut arboles = Vec::with_capacity(params.n_arboles);

    for _ in 0..params.n_arboles {
        // Bootstrap: n extracciones con reemplazo
        let muestra: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
        arboles.push(construir_nodo(
            &x,
            &y,
            &pesos,
            muestra,
            n_features,
            0,
            params.profundidad_max,
            &mut rng,
        ));
    }

    let aciertos = x
        .iter()
        .zip(&y)
        .filter(|&(vector, &clase)| votar_bosque(&arboles, vector).0 == CLASES[clase])
        .count();
    let precision = aciertos as f32 / n as f32;

    println!(
        "[ML] Entrenamiento completado. Precisión en el dataset de entrenamiento: {:.2}",
        precision
    );

    Ok(PostureModel {
        arboles,
        precision_entrenamiento: precision,
    })
}

/// Carga las sesiones del perfil y entrena en un hilo propio; el
/// resultado llega por el canal devuelto. El entrenamiento es de una
/// sola pasada por selección de perfil: el llamador no debe iniciar
/// otro hasta recibir la respuesta.
pub fn entrenar_en_segundo_plano(
    store: ProfileStore,
    perfil: String,
) -> Receiver<Result<PostureModel, TrainError>> {
    let (tx, rx) = bounded(1);

    thread::spawn(move || {
        println!("\n--- INICIANDO ENTRENAMIENTO ML ---");
        let resultado = store
            .cargar_todas_las_sesiones(&perfil)
            .map_err(TrainError::Persistencia)
            .and_then(|datos| entrenar(&datos));
        let _ = tx.send(resultado);
    });

    rx
}

fn votar_bosque(arboles: &[Nodo], caracteristicas: &[f32]) -> (PostureLabel, f32) {
    let total = arboles.len();
    let votos_malo = arboles
        .iter()
        .filter(|arbol| arbol.predecir(caracteristicas) == PostureLabel::Malo)
        .count();
    let votos_perfecto = total - votos_malo;

    if votos_malo > votos_perfecto {
        (PostureLabel::Malo, votos_malo as f32 / total as f32)
    } else {
        (PostureLabel::Perfecto, votos_perfecto as f32 / total as f32)
    }
}

#[allow(clippy::too_many_arguments)]
fn construir_nodo(
    x: &[&[f32]],
    y: &[usize],
    pesos: &[f32; 2],
    indices: Vec<usize>,
    n_features: usize,
    profundidad: usize,
    profundidad_max: usize,
    rng: &mut StdRng,
) -> Nodo {
    let cuenta = cuenta_ponderada(y, pesos, &indices);

    if profundidad >= profundidad_max
        || indices.len() < 2
        || cuenta[0] == 0.0
        || cuenta[1] == 0.0
    {
        return Nodo::Hoja(clase_mayoritaria(&cuenta));
    }

    let division = mejor_division(x, y, pesos, &indices, n_features, rng);
    let (caracteristica, umbral) = match division {
        Some(division) => division,
        None => return Nodo::Hoja(clase_mayoritaria(&cuenta)),
    };

    let (izquierda, derecha): (Vec<usize>, Vec<usize>) = indices
        .into_iter()
        .partition(|&i| x[i][caracteristica] <= umbral);

    if izquierda.is_empty() || derecha.is_empty() {
        return Nodo::Hoja(clase_mayoritaria(&cuenta));
    }

    Nodo::Rama {
        caracteristica,
        umbral,
        izquierda: Box::new(construir_nodo(
            x,
            y,
            pesos,
            izquierda,
            n_features,
            profundidad + 1,
            profundidad_max,
            rng,
        )),
        derecha: Box::new(construir_nodo(
            x,
            y,
            pesos,
            derecha,
            n_features,
            profundidad + 1,
            profundidad_max,
            rng,
        )),
    }
}

/// Busca la división de menor impureza de Gini ponderada entre
/// √n_features características elegidas al azar. Los umbrales candidatos
/// son los puntos medios entre valores consecutivos distintos.
fn mejor_division(
    x: &[&[f32]],
    y: &[usize],
    pesos: &[f32; 2],
    indices: &[usize],
    n_features: usize,
    rng: &mut StdRng,
) -> Option<(usize, f32)> {
    let total = cuenta_ponderada(y, pesos, indices);
    let peso_total = total[0] + total[1];
    let n_candidatas = (n_features as f32).sqrt().ceil() as usize;

    let mut mejor: Option<(usize, f32, f32)> = None;
    let mut orden = indices.to_vec();

    for _ in 0..n_candidatas {
        let f = rng.gen_range(0..n_features);
        orden.sort_by(|&a, &b| {
            x[a][f]
                .partial_cmp(&x[b][f])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut izquierda = [0.0f32; 2];
        for par in 0..orden.len() - 1 {
            let i = orden[par];
            izquierda[y[i]] += pesos[y[i]];

            let actual = x[i][f];
            let siguiente = x[orden[par + 1]][f];
            if siguiente <= actual {
                continue;
            }

            let umbral = (actual + siguiente) / 2.0;
            let derecha = [total[0] - izquierda[0], total[1] - izquierda[1]];
            let impureza = gini_ponderado(&izquierda, &derecha, peso_total);

            if mejor.map_or(true, |(_, _, g)| impureza < g) {
                mejor = Some((f, umbral, impureza));
            }
        }
    }

    mejor.map(|(f, umbral, _)| (f, umbral))
}

fn gini_ponderado(izquierda: &[f32; 2], derecha: &[f32; 2], peso_total: f32) -> f32 {
    let peso_izq = izquierda[0] + izquierda[1];
    let peso_der = derecha[0] + derecha[1];
    (peso_izq * gini_lado(izquierda) + peso_der * gini_lado(derecha)) / peso_total
}

fn gini_lado(lado: &[f32; 2]) -> f32 {
    let suma = lado[0] + lado[1];
    if suma <= 0.0 {
        return 0.0;
    }
    let p0 = lado[0] / suma;
    let p1 = lado[1] / suma;
    1.0 - p0 * p0 - p1 * p1
}

fn cuenta_ponderada(y: &[usize], pesos: &[f32; 2], indices: &[usize]) -> [f32; 2] {
    let mut cuenta = [0.0f32; 2];
    for &i in indices {
        cuenta[y[i]] += pesos[y[i]];
    }
    cuenta
}

fn clase_mayoritaria(cuenta: &[f32; 2]) -> PostureLabel {
    if cuenta[1] > cuenta[0] {
        PostureLabel::Malo
    } else {
        PostureLabel::Perfecto
    }
}
