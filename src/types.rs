/// Número de puntos corporales que entrega el detector externo por frame
pub const NUM_LANDMARKS: usize = 33;

/// Longitud del vector de características: x, y, z por cada landmark
pub const FEATURE_LEN: usize = NUM_LANDMARKS * 3; // 99

/// Un punto corporal detectado con coordenadas 3D normalizadas
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Landmark {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Secuencia ordenada de landmarks de un solo frame de cámara
pub type LandmarkFrame = Vec<Landmark>;

/// Etiquetas de postura del sistema. El entrenamiento usa solo
/// `Perfecto` y `Malo`; `Aceptable` se asigna después del clasificador
/// cuando la votación no es concluyente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostureLabel {
    Perfecto,
    Aceptable,
    Malo,
}

impl PostureLabel {
    /// Nombre en mayúsculas, igual que en los archivos de sesión
    pub fn nombre(&self) -> &'static str {
        match self {
            PostureLabel::Perfecto => "PERFECTO",
            PostureLabel::Aceptable => "ACEPTABLE",
            PostureLabel::Malo => "MALO",
        }
    }
}

/// Resultado del filtro de predicciones: una etiqueta dominante, o
/// `Buscando` cuando la ventana aún no tiene predicciones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmoothedLabel {
    Etiqueta(PostureLabel),
    Buscando,
}

impl SmoothedLabel {
    /// La postura dominante es la mala (dispara alarma y conteo malo)
    pub fn es_mala(&self) -> bool {
        matches!(self, SmoothedLabel::Etiqueta(PostureLabel::Malo))
    }

    /// Perfecto y Aceptable cuentan como tiempo de buena postura
    pub fn cuenta_como_buena(&self) -> bool {
        matches!(
            self,
            SmoothedLabel::Etiqueta(PostureLabel::Perfecto)
                | SmoothedLabel::Etiqueta(PostureLabel::Aceptable)
        )
    }
}
