pub const CONFIG_DIR: &str = ".rnavar";
pub const CONFIG_FILE: &str = "config";
pub const DEFAULT_NUM_CPUS: u32 = 1;
pub const DEFAULT_SJDB_OVERHANG: u32 = 75;
pub const DEFAULT_GENOME_BUILD: &str = "hg19";
pub const DEFAULT_DBSNP_TABLE: &str = "snp138NonFlagged";
pub const DEFAULT_PICARD_JAR: &str = "picard.jar";
pub const DEFAULT_GATK_JAR: &str = "GenomeAnalysisTK.jar";
pub const DEFAULT_BAMFO_JAR: &str = "bamfo.jar";
